//! Orphan detection below a download directory.
//!
//! A local path is an orphan when no tracked torrent accounts for it, it is
//! not ignored, and (for files) it is older than the grace period.

pub mod remover;
pub mod scanner;
pub mod walk;

pub use remover::{FsRemover, Remover};
pub use scanner::{OrphanOptions, OrphanScanner, DEFAULT_GRACE_PERIOD, DEFAULT_WORKERS};
pub use walk::{LocalEntry, PathEnumerator, WalkdirEnumerator};

use serde::Serialize;

/// Outcome counts of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrphanReport {
    pub files_seen: u64,
    pub folders_seen: u64,
    pub tracked: u64,
    pub files_ignored: u64,
    pub folders_ignored: u64,
    pub recent: u64,
    pub skipped: u64,
    pub files_removed: u64,
    pub folders_removed: u64,
    pub failures: u64,
    pub reclaimed_bytes: u64,
}

impl OrphanReport {
    pub fn removed(&self) -> u64 {
        self.files_removed + self.folders_removed
    }
}

impl std::ops::AddAssign<&OrphanReport> for OrphanReport {
    fn add_assign(&mut self, other: &OrphanReport) {
        self.files_seen += other.files_seen;
        self.folders_seen += other.folders_seen;
        self.tracked += other.tracked;
        self.files_ignored += other.files_ignored;
        self.folders_ignored += other.folders_ignored;
        self.recent += other.recent;
        self.skipped += other.skipped;
        self.files_removed += other.files_removed;
        self.folders_removed += other.folders_removed;
        self.failures += other.failures;
        self.reclaimed_bytes += other.reclaimed_bytes;
    }
}
