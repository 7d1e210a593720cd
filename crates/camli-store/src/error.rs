use std::path::PathBuf;

use camli_types::BlobRef;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The reference names an algorithm this server cannot compute.
    #[error("unsupported blob reference: {0}")]
    UnsupportedAlgorithm(BlobRef),

    /// The uploaded bytes do not hash to the claimed reference.
    #[error("digest mismatch for {blob}: content hashes to {computed}")]
    DigestMismatch { blob: BlobRef, computed: BlobRef },

    /// The file at the final path disagrees with what was written.
    #[error("size mismatch for {blob}: wrote {expected} bytes, found {actual}")]
    SizeMismatch {
        blob: BlobRef,
        expected: u64,
        actual: u64,
    },

    /// No blob is stored under this reference.
    #[error("blob not found: {0}")]
    NotFound(BlobRef),

    /// The configured storage root is missing or not a directory.
    #[error("storage root {0:?} is not a directory")]
    InvalidRoot(PathBuf),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Errors caused by what the client sent rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedAlgorithm(_) | Self::DigestMismatch { .. }
        )
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
