use super::{FsRemover, LocalEntry, OrphanReport, PathEnumerator, Remover, WalkdirEnumerator};
use crate::config::OrphanConfig;
use crate::error::{TidyError, TidyResult};
use crate::identity::{IdentityResolver, OsResolver};
use crate::index::TorrentRegistry;
use crate::metrics::ScanMetrics;
use crate::paths::IgnoreList;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};

/// Default minimum age before a file may be removed.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10 * 60);

/// Default number of concurrent file checks.
pub const DEFAULT_WORKERS: usize = 10;

#[derive(Debug, Clone)]
pub struct OrphanOptions {
    pub grace_period: Duration,
    pub ignore: IgnoreList,
    pub workers: usize,
    pub dry_run: bool,
}

impl Default for OrphanOptions {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            ignore: IgnoreList::default(),
            workers: DEFAULT_WORKERS,
            dry_run: false,
        }
    }
}

impl OrphanOptions {
    pub fn from_config(config: &OrphanConfig) -> TidyResult<Self> {
        Ok(Self {
            grace_period: Duration::from_secs(config.grace_period_secs),
            ignore: IgnoreList::new(&config.ignore_paths)?,
            workers: config.workers,
            dry_run: config.dry_run,
        })
    }
}

/// State shared by the file workers.
struct Shared<R> {
    registry: Arc<TorrentRegistry<R>>,
    remover: Arc<dyn Remover>,
    options: OrphanOptions,
    metrics: Arc<ScanMetrics>,
}

impl<R: IdentityResolver> Shared<R> {
    fn is_recent(&self, modified: SystemTime) -> bool {
        // a modification time in the future counts as recent
        SystemTime::now()
            .duration_since(modified)
            .map_or(true, |age| age < self.options.grace_period)
    }

    fn check_file(&self, entry: &LocalEntry) {
        self.metrics.record_file_seen();
        let path = entry.path.to_string_lossy();

        if self.registry.contains_path(&path) {
            self.metrics.record_tracked();
            return;
        }

        if self.options.ignore.is_ignored(&path) {
            debug!(path = %path, "File matches ignore list, skipping");
            self.metrics.record_ignored(false);
            return;
        }

        let modified = match self.remover.modified(&entry.path) {
            Ok(modified) => modified,
            Err(e) => {
                warn!(path = %path, error = %e, "Could not stat file, skipping");
                self.metrics.record_skipped();
                return;
            }
        };
        if self.is_recent(modified) {
            debug!(
                path = %path,
                grace_secs = self.options.grace_period.as_secs(),
                "File modified within grace period, skipping"
            );
            self.metrics.record_recent();
            return;
        }

        // the registry may have changed while this worker was queued
        if self.registry.contains_path(&path) {
            self.metrics.record_tracked();
            return;
        }

        if self.options.dry_run {
            info!(path = %path, size = entry.size, "Would remove orphan file (dry run)");
            self.metrics.record_file_removed(entry.size);
            return;
        }

        match self.remover.remove_file(&entry.path) {
            Ok(()) => {
                info!(path = %path, size = entry.size, "Removed orphan file");
                self.metrics.record_file_removed(entry.size);
            }
            Err(e) => {
                error!(path = %path, error = %e, "Failed removing orphan file");
                self.metrics.record_failure();
            }
        }
    }

    /// Deepest first, so emptied children can make their parent removable
    /// within the same pass.
    fn process_folders(&self, folders: Vec<LocalEntry>) {
        let mut candidates: Vec<PathBuf> = Vec::with_capacity(folders.len());
        for entry in folders {
            self.metrics.record_folder_seen();
            let path = entry.path.to_string_lossy();

            if self.registry.contains_path(&path) {
                self.metrics.record_tracked();
                continue;
            }
            if self.options.ignore.is_ignored(&path) {
                debug!(path = %path, "Folder matches ignore list, skipping");
                self.metrics.record_ignored(true);
                continue;
            }
            candidates.push(entry.path);
        }

        candidates.sort_by(|a, b| {
            let depth = |p: &Path| p.components().count();
            depth(b)
                .cmp(&depth(a))
                .then_with(|| b.as_os_str().len().cmp(&a.as_os_str().len()))
                .then_with(|| a.cmp(b))
        });
        debug!(count = candidates.len(), "Processing potential orphan folders");

        for path in candidates {
            match self.remover.is_dir_empty(&path) {
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not read folder, skipping");
                    self.metrics.record_skipped();
                }
                Ok(false) => {
                    debug!(path = %path.display(), "Orphan folder is not empty, skipping");
                }
                Ok(true) if self.options.dry_run => {
                    info!(path = %path.display(), "Would remove empty orphan folder (dry run)");
                    self.metrics.record_folder_removed();
                }
                Ok(true) => match self.remover.remove_dir(&path) {
                    Ok(()) => {
                        info!(path = %path.display(), "Removed empty orphan folder");
                        self.metrics.record_folder_removed();
                    }
                    Err(e) => {
                        error!(path = %path.display(), error = %e, "Failed removing orphan folder");
                        self.metrics.record_failure();
                    }
                },
            }
        }
    }
}

/// Finds and removes local paths that no tracked torrent accounts for.
///
/// Files are checked concurrently by a bounded pool of blocking tasks.
/// Folders are handled afterwards, one at a time. Dropping the `scan`
/// future lets already started file checks run to completion.
pub struct OrphanScanner<R = OsResolver> {
    shared: Arc<Shared<R>>,
    enumerator: Arc<dyn PathEnumerator>,
}

impl<R: IdentityResolver + 'static> OrphanScanner<R> {
    pub fn new(registry: Arc<TorrentRegistry<R>>, options: OrphanOptions) -> Self {
        Self::with_collaborators(
            registry,
            Arc::new(WalkdirEnumerator),
            Arc::new(FsRemover),
            options,
        )
    }

    pub fn with_collaborators(
        registry: Arc<TorrentRegistry<R>>,
        enumerator: Arc<dyn PathEnumerator>,
        remover: Arc<dyn Remover>,
        options: OrphanOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry,
                remover,
                options,
                metrics: Arc::new(ScanMetrics::new()),
            }),
            enumerator,
        }
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.shared.metrics
    }

    pub async fn scan(&self, root: &Path) -> TidyResult<OrphanReport> {
        let enumerator = Arc::clone(&self.enumerator);
        let walk_root = root.to_path_buf();
        let entries = tokio::task::spawn_blocking(move || enumerator.enumerate(&walk_root))
            .await
            .map_err(|e| TidyError::Io(format!("path enumeration task failed: {e}")))??;

        let (folders, files): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .filter(|entry| entry.path != root)
            .partition(|entry| entry.is_dir);
        info!(
            root = %root.display(),
            files = files.len(),
            folders = folders.len(),
            dry_run = self.shared.options.dry_run,
            "Retrieved local paths"
        );

        let workers = self.shared.options.workers.max(1);
        stream::iter(files)
            .map(|entry| {
                let shared = Arc::clone(&self.shared);
                tokio::task::spawn_blocking(move || shared.check_file(&entry))
            })
            .buffer_unordered(workers)
            .for_each(|joined| async move {
                if let Err(e) = joined {
                    error!(error = %e, "Orphan file check task failed");
                }
            })
            .await;

        let shared = Arc::clone(&self.shared);
        tokio::task::spawn_blocking(move || shared.process_folders(folders))
            .await
            .map_err(|e| TidyError::Io(format!("folder pass failed: {e}")))?;

        Ok(self.shared.metrics.report())
    }

    /// Logs the scan counters together with containment cache statistics.
    pub fn log_summary(&self) {
        let cache = self.shared.registry.files().cache_stats();
        self.shared
            .metrics
            .log_summary(&cache, self.shared.options.dry_run);
    }
}
