//! Filesystem boundary.
//!
//! Pipelines never touch the disk directly: the runner reads each file once
//! through a [`FileStore`] before its step chain and writes it once after.

use std::path::{Path, PathBuf};

use crate::error::{PatchError, PatchResult};
use crate::util::atomic::atomic_write;

/// Read/write access to the files being patched.
pub trait FileStore {
    fn exists(&self, path: &Path) -> bool;

    /// Read a file that must exist. A missing file is
    /// [`PatchError::MissingTargetFile`].
    fn read(&self, path: &Path) -> PatchResult<String>;

    fn write(&self, path: &Path, contents: &str) -> PatchResult<()>;
}

/// [`FileStore`] rooted at a project directory on disk.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl FileStore for DiskStore {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn read(&self, path: &Path) -> PatchResult<String> {
        let full = self.resolve(path);
        std::fs::read_to_string(&full).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                PatchError::MissingTargetFile {
                    path: full.clone(),
                    hint: "generate the native projects before patching".to_owned(),
                }
            } else {
                PatchError::Io { path: full.clone(), source }
            }
        })
    }

    fn write(&self, path: &Path, contents: &str) -> PatchResult<()> {
        let full = self.resolve(path);
        atomic_write(&full, contents).map_err(|e| PatchError::Io {
            path: full.clone(),
            source: std::io::Error::other(format!("{e:#}")),
        })
    }
}
