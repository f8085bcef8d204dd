use super::{HardlinkIndex, TorrentFileIndex, DEFAULT_RESULT_CACHE_ENTRIES};
use crate::identity::{IdentityResolver, OsResolver};
use crate::paths::PathMapping;
use crate::types::Torrent;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Tuning knobs for building a [`TorrentRegistry`].
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Concurrent identity resolutions during the build
    pub workers: usize,
    /// Bound on cached containment answers
    pub cache_entries: u64,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            workers: 10,
            cache_entries: DEFAULT_RESULT_CACHE_ENTRIES,
        }
    }
}

/// What both indices say about one torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TorrentFacts {
    /// No file path is shared with another torrent
    pub unique: bool,
    /// No file shares its on-disk data with another torrent's path
    pub hardlink_unique: bool,
    /// None of the files are referenced by any tracked torrent
    pub no_instances: bool,
    /// Some file has links on disk the client does not know about
    pub hardlinked_outside_client: bool,
}

/// Owns the per-run indices. Built once per invocation and handed by
/// reference to whatever needs lookups.
pub struct TorrentRegistry<R = OsResolver> {
    files: TorrentFileIndex,
    links: Arc<HardlinkIndex<R>>,
}

impl TorrentRegistry<OsResolver> {
    pub async fn build(torrents: &[Torrent], mapping: PathMapping, options: RegistryOptions) -> Self {
        Self::build_with_resolver(torrents, mapping, OsResolver, options).await
    }
}

impl<R: IdentityResolver + 'static> TorrentRegistry<R> {
    pub async fn build_with_resolver(
        torrents: &[Torrent],
        mapping: PathMapping,
        resolver: R,
        options: RegistryOptions,
    ) -> Self {
        let started = Instant::now();

        let files = TorrentFileIndex::from_torrents(torrents, options.cache_entries);
        let links = Arc::new(HardlinkIndex::with_resolver(mapping, resolver));
        links.populate(torrents, options.workers).await;

        info!(
            torrents = torrents.len(),
            paths = files.len(),
            identities = links.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built torrent registry"
        );

        Self { files, links }
    }
}

impl<R: IdentityResolver> TorrentRegistry<R> {
    pub fn from_parts(files: TorrentFileIndex, links: HardlinkIndex<R>) -> Self {
        Self {
            files,
            links: Arc::new(links),
        }
    }

    pub fn files(&self) -> &TorrentFileIndex {
        &self.files
    }

    pub fn links(&self) -> &HardlinkIndex<R> {
        &self.links
    }

    pub fn mapping(&self) -> &PathMapping {
        self.links.mapping()
    }

    /// Starts tracking a torrent in both indices.
    pub fn track(&self, torrent: &Torrent) {
        self.files.add(torrent);
        self.links.add_by_torrent(torrent);
    }

    /// Stops tracking a torrent in both indices.
    pub fn forget(&self, torrent: &Torrent) {
        self.files.remove(torrent);
        self.links.remove_by_torrent(torrent);
    }

    /// Local path containment, using the registry's mapping.
    pub fn contains_path(&self, local_path: &str) -> bool {
        self.files.contains_path(local_path, self.links.mapping())
    }

    pub fn facts(&self, torrent: &Torrent) -> TorrentFacts {
        // each call takes and releases its own index lock
        TorrentFacts {
            unique: self.files.is_unique(torrent),
            hardlink_unique: self.links.is_torrent_unique(torrent),
            no_instances: self.files.has_no_instances(torrent),
            hardlinked_outside_client: self.links.is_hardlinked_outside_client(torrent),
        }
    }
}
