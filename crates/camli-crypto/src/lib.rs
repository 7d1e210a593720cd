//! Digest computation for the camli blob server.
//!
//! [`BlobHasher`] is the incremental accumulator fed by the write path and by
//! the client when naming files. It wraps established digest crates; there is
//! no custom cryptography here.

pub mod hasher;

pub use hasher::BlobHasher;
