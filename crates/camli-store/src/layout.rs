use std::path::{Path, PathBuf};

use camli_types::BlobRef;

use crate::error::{StoreError, StoreResult};

/// Maps blob references to paths under a storage root.
///
/// Every path is a pure function of the reference:
/// `root/digest[0:3]/digest[3:6]/{algorithm}-{digest}.dat`. The two shard
/// levels keep any one directory from accumulating millions of entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Layout over `root` without checking that it exists.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout over an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        match std::fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => Ok(Self { root }),
            _ => Err(StoreError::InvalidRoot(root)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that holds the blob and its scratch files.
    pub fn shard_dir(&self, blob: &BlobRef) -> StoreResult<PathBuf> {
        let shard = supported(blob)?
            .shard_path()
            .ok_or_else(|| StoreError::UnsupportedAlgorithm(blob.clone()))?;
        Ok(self.root.join(shard))
    }

    /// Final path of the blob.
    pub fn blob_path(&self, blob: &BlobRef) -> StoreResult<PathBuf> {
        Ok(self.shard_dir(blob)?.join(blob.file_base_name()))
    }

    /// Recover the reference from a stored file's name, if it is one of ours.
    pub fn blob_for_file_name(name: &str) -> Option<BlobRef> {
        let stem = name.strip_suffix(".dat")?;
        BlobRef::parse(stem).ok().filter(BlobRef::is_supported)
    }
}

fn supported(blob: &BlobRef) -> StoreResult<&BlobRef> {
    if blob.is_supported() {
        Ok(blob)
    } else {
        Err(StoreError::UnsupportedAlgorithm(blob.clone()))
    }
}
