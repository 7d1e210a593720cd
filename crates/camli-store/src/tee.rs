use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use camli_crypto::BlobHasher;
use tokio::io::AsyncWrite;

/// Writer that fans each byte out to an inner sink and a digest accumulator.
///
/// Bytes reach the hasher only after the sink has accepted them, so the
/// digest always covers exactly what was written. A sink failure surfaces
/// unchanged and the hasher never sees the rejected bytes.
#[derive(Debug)]
pub struct HashingWriter<W> {
    inner: W,
    hasher: BlobHasher,
    written: u64,
}

impl<W> HashingWriter<W> {
    pub fn new(inner: W, hasher: BlobHasher) -> Self {
        Self {
            inner,
            hasher,
            written: 0,
        }
    }

    /// Bytes accepted by the sink so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Give back the sink and the accumulated digest state.
    pub fn into_parts(self) -> (W, BlobHasher) {
        (self.inner, self.hasher)
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for HashingWriter<W> {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let n = ready!(Pin::new(&mut this.inner).poll_write(cx, buf))?;
        this.hasher.update(&buf[..n]);
        this.written += n as u64;
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camli_types::HashAlgorithm;
    use tokio::io::AsyncWriteExt;

    /// Accepts a fixed number of bytes, then fails.
    struct FailingSink {
        remaining: usize,
        received: Vec<u8>,
    }

    impl AsyncWrite for FailingSink {
        fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
            let this = self.get_mut();
            if this.remaining == 0 {
                return Poll::Ready(Err(io::Error::other("disk full")));
            }
            let n = buf.len().min(this.remaining);
            this.remaining -= n;
            this.received.extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn both_consumers_see_same_bytes() {
        let mut writer = HashingWriter::new(Vec::new(), BlobHasher::new(HashAlgorithm::Sha1));
        writer.write_all(b"hel").await.unwrap();
        writer.write_all(b"lo").await.unwrap();
        assert_eq!(writer.written(), 5);

        let (sink, hasher) = writer.into_parts();
        assert_eq!(sink, b"hello");
        assert_eq!(
            hasher.finalize().to_string(),
            "sha1-aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
    }

    #[tokio::test]
    async fn sink_failure_is_surfaced() {
        let sink = FailingSink { remaining: 3, received: Vec::new() };
        let mut writer = HashingWriter::new(sink, BlobHasher::new(HashAlgorithm::Sha1));
        let err = writer.write_all(b"hello").await.unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(writer.written(), 3);

        let (sink, hasher) = writer.into_parts();
        assert_eq!(sink.received, b"hel");
        assert_eq!(hasher.finalize(), BlobHasher::hash(HashAlgorithm::Sha1, b"hel"));
    }
}
