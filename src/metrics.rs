use crate::cache::CacheStats;
use crate::orphan::OrphanReport;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, trace};

/// Counters for one orphan scan. Shared by all workers.
#[derive(Debug)]
pub struct ScanMetrics {
    /// Files handed to workers
    pub files_seen: AtomicU64,
    /// Folders considered after the file pass
    pub folders_seen: AtomicU64,
    /// Paths belonging to a tracked torrent
    pub tracked: AtomicU64,
    pub files_ignored: AtomicU64,
    pub folders_ignored: AtomicU64,
    /// Files younger than the grace period
    pub recent: AtomicU64,
    /// Paths skipped because they could not be inspected
    pub skipped: AtomicU64,
    pub files_removed: AtomicU64,
    pub folders_removed: AtomicU64,
    /// Removals the OS refused
    pub failures: AtomicU64,
    /// Bytes of removed files
    pub reclaimed_bytes: AtomicU64,
    start_time: Instant,
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            files_seen: AtomicU64::new(0),
            folders_seen: AtomicU64::new(0),
            tracked: AtomicU64::new(0),
            files_ignored: AtomicU64::new(0),
            folders_ignored: AtomicU64::new(0),
            recent: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            files_removed: AtomicU64::new(0),
            folders_removed: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            reclaimed_bytes: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_file_seen(&self) {
        self.files_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_folder_seen(&self) {
        self.folders_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tracked(&self) {
        self.tracked.fetch_add(1, Ordering::Relaxed);
        trace!(scan_op = "tracked");
    }

    pub fn record_ignored(&self, is_dir: bool) {
        if is_dir {
            self.folders_ignored.fetch_add(1, Ordering::Relaxed);
        } else {
            self.files_ignored.fetch_add(1, Ordering::Relaxed);
        }
        trace!(scan_op = "ignored", is_dir);
    }

    pub fn record_recent(&self) {
        self.recent.fetch_add(1, Ordering::Relaxed);
        trace!(scan_op = "recent");
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        trace!(scan_op = "skipped");
    }

    pub fn record_file_removed(&self, bytes: u64) {
        self.files_removed.fetch_add(1, Ordering::Relaxed);
        self.reclaimed_bytes.fetch_add(bytes, Ordering::Relaxed);
        trace!(scan_op = "file_removed", bytes);
    }

    pub fn record_folder_removed(&self) {
        self.folders_removed.fetch_add(1, Ordering::Relaxed);
        trace!(scan_op = "folder_removed");
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Point-in-time copy of the counters.
    pub fn report(&self) -> OrphanReport {
        OrphanReport {
            files_seen: self.files_seen.load(Ordering::Relaxed),
            folders_seen: self.folders_seen.load(Ordering::Relaxed),
            tracked: self.tracked.load(Ordering::Relaxed),
            files_ignored: self.files_ignored.load(Ordering::Relaxed),
            folders_ignored: self.folders_ignored.load(Ordering::Relaxed),
            recent: self.recent.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            files_removed: self.files_removed.load(Ordering::Relaxed),
            folders_removed: self.folders_removed.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            reclaimed_bytes: self.reclaimed_bytes.load(Ordering::Relaxed),
        }
    }

    /// Log a summary of the scan together with the containment cache stats
    pub fn log_summary(&self, cache: &CacheStats, dry_run: bool) {
        let report = self.report();
        let lookups = cache.hits + cache.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            (cache.hits as f64 / lookups as f64) * 100.0
        };

        info!(
            operation = "orphan_scan_summary",
            dry_run,
            files_removed = report.files_removed,
            folders_removed = report.folders_removed,
            failures = report.failures,
            files_ignored = report.files_ignored,
            folders_ignored = report.folders_ignored,
            recent = report.recent,
            skipped = report.skipped,
            tracked = report.tracked,
            reclaimed_bytes = report.reclaimed_bytes,
            cache_hit_rate_pct = hit_rate,
            duration_secs = self.elapsed().as_secs_f64(),
        );
    }
}
