use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// A uniquely named temporary file owned by a single write.
///
/// The file is deleted when the `ScratchFile` is dropped, on every path that
/// does not end in [`commit`](Self::commit). Committing renames it onto its
/// destination, which is the moment the content becomes visible.
#[derive(Debug)]
pub struct ScratchFile {
    file: File,
    path: TempPath,
}

impl ScratchFile {
    /// Create `dir/{prefix}XXXXXX`, where the suffix is random.
    pub async fn create_in(dir: &Path, prefix: &str) -> io::Result<Self> {
        let dir = dir.to_path_buf();
        let prefix = prefix.to_string();
        let named = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new().prefix(&prefix).tempfile_in(&dir)
        })
        .await
        .map_err(io::Error::other)??;
        let (file, path) = named.into_parts();
        Ok(Self {
            file: File::from_std(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    /// Flush, fsync and atomically rename onto `dest`.
    ///
    /// If the rename fails the scratch file is still removed.
    pub async fn commit(self, dest: &Path) -> io::Result<()> {
        let Self { mut file, path } = self;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        let dest: PathBuf = dest.to_path_buf();
        tokio::task::spawn_blocking(move || path.persist(&dest))
            .await
            .map_err(io::Error::other)?
            .map_err(|e| e.error)
    }
}
