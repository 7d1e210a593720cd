//! Sharded on-disk blob storage for the camli blob server.
//!
//! Blobs live at `root/digest[0:3]/digest[3:6]/{algorithm}-{digest}.dat`.
//! Writes stream into a scratch file in the same shard directory while the
//! digest is computed, and the scratch file is renamed into place only after
//! the digest matches the claimed [`BlobRef`](camli_types::BlobRef).
//!
//! # Design Rules
//!
//! 1. A blob at its final path is complete and verified, or absent.
//! 2. The rename is the only visibility point. There are no locks: concurrent
//!    writers of the same reference carry identical bytes by construction.
//! 3. Scratch files belong to exactly one write and are removed on every
//!    failure path.
//! 4. Blobs are never updated or deleted by the store.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod disk;
pub mod error;
pub mod fsck;
pub mod layout;
pub mod scratch;
pub mod tee;
pub mod traits;
pub mod writer;

pub use disk::DiskBlobStore;
pub use error::{StoreError, StoreResult};
pub use fsck::{check_store, CorruptBlob, FsckReport};
pub use layout::StorageLayout;
pub use scratch::ScratchFile;
pub use tee::HashingWriter;
pub use traits::{BlobReader, BlobStore};
pub use writer::AtomicBlobWriter;
