use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use camli_types::BlobRef;
use tokio::fs::{self, File};
use tokio::io::AsyncRead;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::layout::StorageLayout;
use crate::traits::{BlobReader, BlobStore};
use crate::writer::AtomicBlobWriter;

/// Blob store backed by a sharded directory tree.
#[derive(Clone, Debug)]
pub struct DiskBlobStore {
    writer: AtomicBlobWriter,
}

impl DiskBlobStore {
    pub fn new(layout: StorageLayout) -> Self {
        Self {
            writer: AtomicBlobWriter::new(layout),
        }
    }

    /// Open a store over an existing root directory.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let layout = StorageLayout::open(root)?;
        info!(root = %layout.root().display(), "opened blob store");
        Ok(Self::new(layout))
    }

    pub fn layout(&self) -> &StorageLayout {
        self.writer.layout()
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn stat(&self, blob: &BlobRef) -> StoreResult<Option<u64>> {
        let path = self.layout().blob_path(blob)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn open(&self, blob: &BlobRef) -> StoreResult<BlobReader> {
        let size = self
            .stat(blob)
            .await?
            .ok_or_else(|| StoreError::NotFound(blob.clone()))?;
        let path = self.layout().blob_path(blob)?;
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(blob.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(BlobReader {
            size,
            reader: Box::new(file),
        })
    }

    async fn write(
        &self,
        blob: &BlobRef,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StoreResult<u64> {
        self.writer.write(blob, source).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camli_crypto::BlobHasher;
    use camli_types::HashAlgorithm;
    use tokio::io::AsyncReadExt;

    fn store() -> (tempfile::TempDir, DiskBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskBlobStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn roundtrip_through_trait() {
        let (_dir, store) = store();
        let store: &dyn BlobStore = &store;
        let blob = BlobHasher::hash(HashAlgorithm::Sha1, b"hello");

        assert_eq!(store.stat(&blob).await.unwrap(), None);
        let mut source: &[u8] = b"hello";
        assert_eq!(store.write(&blob, &mut source).await.unwrap(), 5);
        assert_eq!(store.stat(&blob).await.unwrap(), Some(5));

        let mut opened = store.open(&blob).await.unwrap();
        assert_eq!(opened.size, 5);
        let mut body = Vec::new();
        opened.reader.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn open_missing_is_not_found() {
        let (_dir, store) = store();
        let blob = BlobHasher::hash(HashAlgorithm::Sha1, b"never written");
        assert!(matches!(
            store.open(&blob).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.stat(&blob).await.unwrap(), None);
    }

    #[tokio::test]
    async fn directory_at_blob_path_is_not_a_blob() {
        let (_dir, store) = store();
        let blob = BlobHasher::hash(HashAlgorithm::Sha1, b"dir");
        std::fs::create_dir_all(store.layout().blob_path(&blob).unwrap()).unwrap();
        assert_eq!(store.stat(&blob).await.unwrap(), None);
        assert!(matches!(store.open(&blob).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn unsupported_stat_is_an_error() {
        let (_dir, store) = store();
        let blob = BlobRef::parse("md5-0123456789abcdef0123456789abcdef").unwrap();
        assert!(matches!(
            store.stat(&blob).await,
            Err(StoreError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn open_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DiskBlobStore::open(dir.path().join("nope")),
            Err(StoreError::InvalidRoot(_))
        ));
    }
}
