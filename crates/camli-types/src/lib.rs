//! Foundation types for the camli blob server.
//!
//! Every blob is addressed by a [`BlobRef`], an `{algorithm}-{digest}` pair
//! such as `sha1-aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d`. The reference is
//! both the storage key and the claim the server verifies when bytes arrive.
//!
//! # Key Types
//!
//! - [`BlobRef`]: validated algorithm/digest pair, a pure value
//! - [`HashAlgorithm`]: the digest schemes this server can compute
//! - [`BlobRefError`]: why a piece of text is not a blob reference

pub mod algorithm;
pub mod blobref;
pub mod error;

pub use algorithm::HashAlgorithm;
pub use blobref::{BlobRef, PATH_PREFIX};
pub use error::BlobRefError;
