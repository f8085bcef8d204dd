use crate::error::{TidyError, TidyResult};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One filesystem entry found below a scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    /// Size in bytes; zero for directories
    pub size: u64,
}

impl LocalEntry {
    pub fn file(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
            size,
        }
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
            size: 0,
        }
    }

    /// Number of path components.
    pub fn depth(&self) -> usize {
        self.path.components().count()
    }
}

/// Lists everything below a root, excluding the root itself.
pub trait PathEnumerator: Send + Sync {
    fn enumerate(&self, root: &Path) -> TidyResult<Vec<LocalEntry>>;
}

/// Recursive directory walk that does not follow symlinks.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkdirEnumerator;

impl PathEnumerator for WalkdirEnumerator {
    fn enumerate(&self, root: &Path) -> TidyResult<Vec<LocalEntry>> {
        let meta = std::fs::metadata(root)?;
        if !meta.is_dir() {
            return Err(TidyError::InvalidArgument(format!(
                "scan root is not a directory: {}",
                root.display()
            )));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = %root.display(), error = %e, "Skipping unreadable path");
                    continue;
                }
            };

            let file_type = entry.file_type();
            let size = if file_type.is_file() {
                entry.metadata().map(|m| m.len()).unwrap_or(0)
            } else {
                0
            };
            entries.push(LocalEntry {
                is_dir: file_type.is_dir(),
                size,
                path: entry.into_path(),
            });
        }

        debug!(root = %root.display(), entries = entries.len(), "Enumerated local paths");
        Ok(entries)
    }
}
