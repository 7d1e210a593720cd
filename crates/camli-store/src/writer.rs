use std::path::Path;

use camli_crypto::BlobHasher;
use camli_types::BlobRef;
use tokio::fs;
use tokio::io::AsyncRead;
use tracing::{debug, error, warn};

use crate::error::{StoreError, StoreResult};
use crate::layout::StorageLayout;
use crate::scratch::ScratchFile;
use crate::tee::HashingWriter;

/// Hash-verified, all-or-nothing blob writer.
///
/// The source is streamed once into a scratch file in the blob's shard
/// directory while its digest is accumulated. Only when the digest equals the
/// claimed reference is the scratch file renamed onto the final path; every
/// other outcome removes the scratch file and leaves the final path
/// untouched.
#[derive(Clone, Debug)]
pub struct AtomicBlobWriter {
    layout: StorageLayout,
}

impl AtomicBlobWriter {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Store `source` under `blob`. Returns the number of bytes written.
    pub async fn write<R>(&self, blob: &BlobRef, source: &mut R) -> StoreResult<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let hasher = BlobHasher::for_blob(blob)
            .ok_or_else(|| StoreError::UnsupportedAlgorithm(blob.clone()))?;
        let shard_dir = self.layout.shard_dir(blob)?;
        let final_path = self.layout.blob_path(blob)?;

        create_shard_dir(&shard_dir).await?;
        let mut scratch = ScratchFile::create_in(&shard_dir, &blob.scratch_prefix()).await?;
        debug!(blob = %blob, scratch = %scratch.path().display(), "receiving blob");

        let mut sink = HashingWriter::new(scratch.file_mut(), hasher);
        let written = match tokio::io::copy(source, &mut sink).await {
            Ok(n) => n,
            Err(e) => {
                warn!(blob = %blob, error = %e, "blob stream failed, discarding scratch file");
                return Err(e.into());
            }
        };
        let (_, hasher) = sink.into_parts();
        let computed = hasher.finalize();
        if computed != *blob {
            warn!(blob = %blob, computed = %computed, "digest mismatch, discarding scratch file");
            return Err(StoreError::DigestMismatch {
                blob: blob.clone(),
                computed,
            });
        }

        scratch.commit(&final_path).await?;

        verify_published(blob, &final_path, written).await?;

        debug!(blob = %blob, bytes = written, "blob stored");
        Ok(written)
    }
}

/// Re-check the visible file after publishing. On disagreement the file is
/// left in place for offline repair.
pub(crate) async fn verify_published(blob: &BlobRef, path: &Path, written: u64) -> StoreResult<()> {
    let meta = fs::symlink_metadata(path).await?;
    if meta.is_file() && meta.len() == written {
        return Ok(());
    }
    error!(
        blob = %blob,
        path = %path.display(),
        expected = written,
        actual = meta.len(),
        regular = meta.is_file(),
        "stored blob does not match bytes written"
    );
    Err(StoreError::SizeMismatch {
        blob: blob.clone(),
        expected: written,
        actual: meta.len(),
    })
}

async fn create_shard_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use camli_types::HashAlgorithm;
    use std::io;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    fn setup() -> (tempfile::TempDir, AtomicBlobWriter) {
        let dir = tempfile::tempdir().unwrap();
        let writer = AtomicBlobWriter::new(StorageLayout::new(dir.path()));
        (dir, writer)
    }

    fn blob_of(data: &[u8]) -> BlobRef {
        BlobHasher::hash(HashAlgorithm::Sha1, data)
    }

    fn files_under(dir: &Path) -> Vec<std::path::PathBuf> {
        walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    }

    /// Yields some bytes, then fails.
    struct BrokenSource {
        sent: bool,
    }

    impl AsyncRead for BrokenSource {
        fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            if this.sent {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away")));
            }
            this.sent = true;
            buf.put_slice(b"partial");
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn write_then_read_back() {
        let (_dir, writer) = setup();
        let data = b"hello";
        let blob = blob_of(data);

        let n = writer.write(&blob, &mut &data[..]).await.unwrap();
        assert_eq!(n, 5);

        let path = writer.layout().blob_path(&blob).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), data);
    }

    #[tokio::test]
    async fn digest_mismatch_leaves_nothing() {
        let (dir, writer) = setup();
        let blob = blob_of(b"expected");

        let err = writer.write(&blob, &mut &b"something else"[..]).await.unwrap_err();
        match err {
            StoreError::DigestMismatch { blob: claimed, computed } => {
                assert_eq!(claimed, blob);
                assert_eq!(computed, blob_of(b"something else"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!writer.layout().blob_path(&blob).unwrap().exists());
        assert!(files_under(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn stream_error_removes_scratch_file() {
        let (dir, writer) = setup();
        let blob = blob_of(b"partial and more");

        let err = writer.write(&blob, &mut BrokenSource { sent: false }).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(files_under(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn unsupported_algorithm_is_rejected_before_io() {
        let (dir, writer) = setup();
        let blob = BlobRef::parse("md5-0123456789abcdef0123456789abcdef").unwrap();
        let err = writer.write(&blob, &mut &b"x"[..]).await.unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedAlgorithm(_)));
        assert!(err.is_client_error());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn rewriting_existing_blob_succeeds() {
        let (dir, writer) = setup();
        let blob = blob_of(b"twice");
        writer.write(&blob, &mut &b"twice"[..]).await.unwrap();
        writer.write(&blob, &mut &b"twice"[..]).await.unwrap();
        assert_eq!(files_under(dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn empty_blob() {
        let (_dir, writer) = setup();
        let blob = blob_of(b"");
        assert_eq!(writer.write(&blob, &mut &b""[..]).await.unwrap(), 0);
        let path = writer.layout().blob_path(&blob).unwrap();
        assert_eq!(std::fs::metadata(path).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn concurrent_writers_of_same_blob_both_succeed() {
        let (dir, writer) = setup();
        let writer = Arc::new(writer);
        let data: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
        let blob = blob_of(&data);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let writer = Arc::clone(&writer);
            let blob = blob.clone();
            let data = data.clone();
            tasks.push(tokio::spawn(async move {
                writer.write(&blob, &mut &data[..]).await
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), data.len() as u64);
        }

        let files = files_under(dir.path());
        assert_eq!(files.len(), 1);
        assert_eq!(std::fs::read(&files[0]).unwrap(), data);
    }

    #[tokio::test]
    async fn short_published_file_is_reported_and_kept() {
        let (_dir, writer) = setup();
        let blob = blob_of(b"hello");
        let path = writer.layout().blob_path(&blob).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"hell").unwrap();

        match verify_published(&blob, &path, 5).await.unwrap_err() {
            StoreError::SizeMismatch { blob: reported, expected, actual } => {
                assert_eq!(reported, blob);
                assert_eq!(expected, 5);
                assert_eq!(actual, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(std::fs::read(&path).unwrap(), b"hell");

        verify_published(&blob, &path, 4).await.unwrap();
    }

    #[tokio::test]
    async fn directory_at_final_path_is_a_mismatch() {
        let (_dir, writer) = setup();
        let blob = blob_of(b"hello");
        let path = writer.layout().blob_path(&blob).unwrap();
        std::fs::create_dir_all(&path).unwrap();

        let err = verify_published(&blob, &path, 5).await.unwrap_err();
        assert!(matches!(err, StoreError::SizeMismatch { expected: 5, .. }));
        assert!(!err.is_client_error());
        assert!(path.is_dir());
    }
}
