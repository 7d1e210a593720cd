use thiserror::Error;

/// Reasons a string is rejected as a blob reference.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlobRefError {
    #[error("empty blob reference")]
    Empty,

    #[error("missing '-' between algorithm and digest in {0:?}")]
    MissingSeparator(String),

    #[error("invalid algorithm name {0:?}")]
    InvalidAlgorithm(String),

    #[error("invalid digest {0:?}: expected lowercase hex")]
    InvalidDigest(String),

    #[error("digest length for {algorithm}: expected {expected}, got {actual}")]
    DigestLength {
        algorithm: String,
        expected: usize,
        actual: usize,
    },

    #[error("path {0:?} does not start with /camli/")]
    MissingPathPrefix(String),
}
