//! Offline consistency check of a storage root.
//!
//! Walks the tree without modifying it and reports blobs whose content does
//! not match their name, files in the wrong shard, unrecognised files, and
//! scratch files left behind by interrupted writers.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use camli_crypto::BlobHasher;
use camli_types::BlobRef;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::StoreResult;
use crate::layout::StorageLayout;

/// A stored blob whose bytes hash to something other than its name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorruptBlob {
    pub path: PathBuf,
    pub expected: BlobRef,
    pub actual: BlobRef,
}

/// Result of [`check_store`].
#[derive(Clone, Debug, Default)]
pub struct FsckReport {
    pub blobs_checked: usize,
    pub bytes_checked: u64,
    pub corrupt: Vec<CorruptBlob>,
    pub misplaced: Vec<PathBuf>,
    pub unrecognized: Vec<PathBuf>,
    pub scratch_files: Vec<PathBuf>,
}

impl FsckReport {
    /// No corrupt or misplaced blobs. Leftover scratch files and unknown files
    /// are reported but do not make a store unclean.
    pub fn is_clean(&self) -> bool {
        self.corrupt.is_empty() && self.misplaced.is_empty()
    }
}

/// Verify every blob under the layout's root.
pub fn check_store(layout: &StorageLayout) -> StoreResult<FsckReport> {
    let mut report = FsckReport::default();

    for entry in WalkDir::new(layout.root()).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path().to_path_buf();
        let name = entry.file_name().to_string_lossy();

        if name.contains(".dat.tmp") {
            debug!(path = %path.display(), "found scratch file");
            report.scratch_files.push(path);
            continue;
        }
        let Some(blob) = StorageLayout::blob_for_file_name(&name) else {
            report.unrecognized.push(path);
            continue;
        };
        if layout.blob_path(&blob)? != path {
            warn!(blob = %blob, path = %path.display(), "blob stored outside its shard");
            report.misplaced.push(path);
            continue;
        }
        let Some(algorithm) = blob.hash_algorithm() else {
            report.unrecognized.push(path);
            continue;
        };

        let file = BufReader::new(File::open(&path)?);
        let (actual, size) = BlobHasher::hash_reader(algorithm, file)?;
        report.blobs_checked += 1;
        report.bytes_checked += size;
        if actual != blob {
            warn!(blob = %blob, actual = %actual, "blob content does not match its name");
            report.corrupt.push(CorruptBlob {
                path,
                expected: blob,
                actual,
            });
        }
    }

    Ok(report)
}
