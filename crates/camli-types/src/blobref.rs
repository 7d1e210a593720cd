use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algorithm::HashAlgorithm;
use crate::error::BlobRefError;

/// URL path prefix under which blobs are addressed.
pub const PATH_PREFIX: &str = "/camli/";

/// Content-addressed reference to a blob: `{algorithm}-{digest}`.
///
/// A `BlobRef` is a pure value. Two references with the same algorithm and
/// digest are equal, and both fields are fixed at construction.
///
/// Lexical validation accepts any lowercase alphanumeric algorithm name, but
/// a reference with an unknown algorithm can never be stored or read: check
/// [`BlobRef::is_supported`] before doing anything with it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobRef {
    algorithm: String,
    digest: String,
}

impl BlobRef {
    /// Parse the bare `algorithm-digest` form.
    ///
    /// Grammar: `[a-z0-9]+ "-" [a-f0-9]+` spanning the whole input. When the
    /// algorithm is one whose digest size is known, the digest must have
    /// exactly that many characters.
    pub fn parse(text: &str) -> Result<Self, BlobRefError> {
        if text.is_empty() {
            return Err(BlobRefError::Empty);
        }
        let (algorithm, digest) = text
            .split_once('-')
            .ok_or_else(|| BlobRefError::MissingSeparator(text.to_string()))?;
        Self::new(algorithm, digest)
    }

    /// Parse a request path of the form `/camli/algorithm-digest`.
    pub fn from_path(path: &str) -> Result<Self, BlobRefError> {
        let rest = path
            .strip_prefix(PATH_PREFIX)
            .ok_or_else(|| BlobRefError::MissingPathPrefix(path.to_string()))?;
        Self::parse(rest)
    }

    /// Build a reference from its two halves, applying the same validation
    /// as [`BlobRef::parse`].
    pub fn new(algorithm: &str, digest: &str) -> Result<Self, BlobRefError> {
        if algorithm.is_empty() || !algorithm.bytes().all(is_algorithm_byte) {
            return Err(BlobRefError::InvalidAlgorithm(algorithm.to_string()));
        }
        if digest.is_empty() || !digest.bytes().all(is_digest_byte) {
            return Err(BlobRefError::InvalidDigest(digest.to_string()));
        }
        if let Some(expected) = HashAlgorithm::expected_hex_len(algorithm) {
            if digest.len() != expected {
                return Err(BlobRefError::DigestLength {
                    algorithm: algorithm.to_string(),
                    expected,
                    actual: digest.len(),
                });
            }
        }
        Ok(Self {
            algorithm: algorithm.to_string(),
            digest: digest.to_string(),
        })
    }

    /// Reference for a digest computed with a supported scheme.
    pub fn for_digest(algorithm: HashAlgorithm, digest: &[u8]) -> Self {
        debug_assert_eq!(digest.len(), algorithm.digest_len());
        Self {
            algorithm: algorithm.name().to_string(),
            digest: hex::encode(digest),
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Lowercase hex digest.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// The scheme for this reference, if the server implements it.
    pub fn hash_algorithm(&self) -> Option<HashAlgorithm> {
        HashAlgorithm::from_name(&self.algorithm)
    }

    /// `true` only for references the server can hash and store.
    pub fn is_supported(&self) -> bool {
        self.hash_algorithm().is_some()
    }

    /// File name of the stored blob: `{algorithm}-{digest}.dat`.
    pub fn file_base_name(&self) -> String {
        format!("{}-{}.dat", self.algorithm, self.digest)
    }

    /// Prefix for scratch files holding an in-flight write of this blob.
    pub fn scratch_prefix(&self) -> String {
        format!("{}.tmp", self.file_base_name())
    }

    /// Shard directory relative to the storage root: `digest[0:3]/digest[3:6]`.
    ///
    /// `None` when the digest is too short to shard, which only happens for
    /// unsupported algorithms.
    pub fn shard_path(&self) -> Option<PathBuf> {
        let first = self.digest.get(0..3)?;
        let second = self.digest.get(3..6)?;
        Some([first, second].iter().collect())
    }

    /// Blob file path relative to the storage root.
    pub fn relative_path(&self) -> Option<PathBuf> {
        self.shard_path().map(|dir| dir.join(self.file_base_name()))
    }
}

fn is_algorithm_byte(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit()
}

fn is_digest_byte(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'a'..=b'f')
}

impl fmt::Debug for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobRef({self})")
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.algorithm, self.digest)
    }
}

impl FromStr for BlobRef {
    type Err = BlobRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BlobRef {
    type Error = BlobRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BlobRef> for String {
    fn from(blob: BlobRef) -> Self {
        blob.to_string()
    }
}
