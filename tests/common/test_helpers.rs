//! Consolidated test helpers for torrent-tidy
//!
//! [`DownloadTree`] wraps a temporary directory and builds real files,
//! folders and hardlinks inside it, so identity and orphan tests run
//! against the actual filesystem.
//!
//! # Usage
//!
//! ```rust
//! let tree = DownloadTree::new();
//! let a = tree.file("movies/a.mkv", b"data");
//! let b = tree.hardlink("movies/a.mkv", "seed/a.mkv");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use torrent_tidy::Torrent;

/// Temporary download directory, deleted on drop
pub struct DownloadTree {
    dir: TempDir,
}

impl Default for DownloadTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Root of the tree
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `rel` inside the tree
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Absolute path of `rel` as a string, the form torrents carry
    pub fn path_str(&self, rel: &str) -> String {
        self.path(rel).to_string_lossy().into_owned()
    }

    /// Create a folder (and its parents)
    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).expect("failed to create dir");
        path
    }

    /// Create a file with `content`, creating parent folders
    ///
    /// The modification time is set an hour in the past so the file is
    /// outside any reasonable grace period.
    pub fn file(&self, rel: &str, content: &[u8]) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent");
        }
        fs::write(&path, content).expect("failed to write file");
        self.age(rel, Duration::from_secs(3600));
        path
    }

    /// Create a file that was modified just now
    pub fn fresh_file(&self, rel: &str, content: &[u8]) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent");
        }
        fs::write(&path, content).expect("failed to write file");
        path
    }

    /// Hardlink `existing` to `link`, creating parent folders
    pub fn hardlink(&self, existing: &str, link: &str) -> PathBuf {
        let target = self.path(link);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).expect("failed to create parent");
        }
        fs::hard_link(self.path(existing), &target).expect("failed to create hardlink");
        target
    }

    /// Push the modification time of `rel` back by `by`
    pub fn age(&self, rel: &str, by: Duration) {
        let file = fs::File::options()
            .write(true)
            .open(self.path(rel))
            .expect("failed to open file");
        file.set_modified(SystemTime::now() - by)
            .expect("failed to set mtime");
    }

    /// Torrent owning the given tree-relative files
    pub fn torrent(&self, hash: &str, rels: &[&str]) -> Torrent {
        Torrent::new(hash, rels.iter().map(|r| self.path_str(r)).collect())
            .with_name(hash)
            .with_save_path(self.root().to_string_lossy())
    }

    /// Write a `{hash: torrent}` snapshot file into the tree and return it
    pub fn snapshot(&self, rel: &str, torrents: &[Torrent]) -> PathBuf {
        let map: std::collections::BTreeMap<&str, &Torrent> =
            torrents.iter().map(|t| (t.hash.as_str(), t)).collect();
        let path = self.path(rel);
        fs::write(&path, serde_json::to_vec_pretty(&map).expect("serialize"))
            .expect("failed to write snapshot");
        path
    }
}
