use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use camli_store::BlobReader;
use camli_types::BlobRef;
use futures::Stream;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::error;

/// Response body for a stored blob.
///
/// The response advertises `Content-Length` up front, so this stream must
/// yield exactly that many bytes. A short file, a long file, or a read error
/// surfaces as a stream error, which makes hyper drop the connection instead
/// of completing a response the peer would take as whole.
pub struct BlobBody {
    blob: BlobRef,
    inner: ReaderStream<Box<dyn AsyncRead + Send + Unpin>>,
    remaining: u64,
    done: bool,
}

impl BlobBody {
    pub fn new(blob: BlobRef, opened: BlobReader) -> Self {
        Self {
            blob,
            inner: ReaderStream::new(opened.reader),
            remaining: opened.size,
            done: false,
        }
    }

    fn fail(&mut self, err: io::Error) -> Poll<Option<io::Result<Bytes>>> {
        error!(blob = %self.blob, error = %err, "aborting blob response");
        self.done = true;
        Poll::Ready(Some(Err(err)))
    }
}

impl Stream for BlobBody {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
            Some(Ok(chunk)) => {
                let len = chunk.len() as u64;
                if len > this.remaining {
                    let err = io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("blob grew past its advertised size by {} bytes", len - this.remaining),
                    );
                    return this.fail(err);
                }
                this.remaining -= len;
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(e)) => this.fail(e),
            None if this.remaining > 0 => {
                let err = io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("blob ended {} bytes short", this.remaining),
                );
                this.fail(err)
            }
            None => {
                this.done = true;
                Poll::Ready(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn body(size: u64, data: &'static [u8]) -> BlobBody {
        let blob = BlobRef::parse("sha1-aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d").unwrap();
        BlobBody::new(
            blob,
            BlobReader {
                size,
                reader: Box::new(data),
            },
        )
    }

    async fn drain(mut body: BlobBody) -> (Vec<u8>, Option<io::Error>) {
        let mut out = Vec::new();
        while let Some(item) = body.next().await {
            match item {
                Ok(chunk) => out.extend_from_slice(&chunk),
                Err(e) => {
                    assert!(body.next().await.is_none());
                    return (out, Some(e));
                }
            }
        }
        (out, None)
    }

    #[tokio::test]
    async fn exact_size_streams_cleanly() {
        let (data, err) = drain(body(5, b"hello")).await;
        assert_eq!(data, b"hello");
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn short_file_errors() {
        let (data, err) = drain(body(10, b"hello")).await;
        assert_eq!(data, b"hello");
        assert_eq!(err.unwrap().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn long_file_errors() {
        let (_, err) = drain(body(3, b"hello")).await;
        assert_eq!(err.unwrap().kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn empty_blob() {
        let (data, err) = drain(body(0, b"")).await;
        assert!(data.is_empty());
        assert!(err.is_none());
    }
}
