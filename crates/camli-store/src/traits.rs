use std::fmt;

use async_trait::async_trait;
use camli_types::BlobRef;
use tokio::io::AsyncRead;

use crate::error::StoreResult;

/// An open stored blob: its size at open time and a reader over its bytes.
pub struct BlobReader {
    pub size: u64,
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
}

impl fmt::Debug for BlobReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobReader").field("size", &self.size).finish()
    }
}

/// Content-addressed blob store.
///
/// All implementations must satisfy these invariants:
/// - A blob is visible only once its full content has been verified against
///   its reference.
/// - Blobs are immutable once written; writing the same reference again is
///   harmless because the bytes must be identical.
/// - Concurrent reads and writes need no coordination beyond the backend's
///   own atomic publish step.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Size of the stored blob, or `None` if no regular file holds it.
    async fn stat(&self, blob: &BlobRef) -> StoreResult<Option<u64>>;

    /// Open a stored blob for streaming.
    ///
    /// Returns `StoreError::NotFound` if the blob is absent.
    async fn open(&self, blob: &BlobRef) -> StoreResult<BlobReader>;

    /// Stream `source` into the store under `blob`, verifying its digest.
    /// Returns the number of bytes written.
    async fn write(
        &self,
        blob: &BlobRef,
        source: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StoreResult<u64>;
}
