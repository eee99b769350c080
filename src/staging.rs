//! Local scratch files used while a source object is being processed.
//!
//! Staging paths are deterministic, so a warm process that handles many
//! invocations would otherwise accumulate one file per original and one per
//! derivative. A [`StagedFile`] owns its path and removes the file when
//! dropped, on success, on failure and on cancellation alike.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

/// A claimed scratch path, removed on drop
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
}

impl StagedFile {
    /// Take ownership of `path`. Nothing needs to exist there yet.
    ///
    /// A relative path is resolved against the current directory now, so a
    /// later `chdir` cannot redirect the cleanup.
    pub fn claim(path: impl Into<PathBuf>) -> io::Result<Self> {
        Ok(Self {
            path: TempPath::try_from_path(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsRef<Path> for StagedFile {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

/// Make sure the scratch root exists before anything is staged into it
pub fn ensure_staging_root(root: &Path) -> io::Result<()> {
    std::fs::create_dir_all(root)
}
