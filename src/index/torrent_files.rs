//! Map from file path to the torrents referencing it.
//!
//! Besides the path map the index keeps three derived structures, all
//! rebuilt on demand and discarded whenever the set of paths changes:
//!
//! - a [`SortedPathIndex`] over the raw paths,
//! - one [`SortedPathIndex`] per path-mapping table over the mapped paths,
//! - a bounded per-query result cache keyed by `(mapping key, query path)`.
//!
//! Mutations take the write lock. Queries take the read lock and publish
//! into the result cache before releasing it, so a cached answer can never
//! outlive the path set it was computed from.

use crate::cache::{Cache, CacheStats};
use crate::paths::{PathMapping, SortedPathIndex};
use crate::types::Torrent;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

/// Default bound on cached `contains_path` answers.
pub const DEFAULT_RESULT_CACHE_ENTRIES: u64 = 100_000;

#[derive(Default)]
struct Inner {
    /// path -> (torrent hash -> torrent). Never holds an empty inner map.
    files: HashMap<String, HashMap<String, Arc<Torrent>>>,
    /// Sorted view of `files` keys; `None` after the path set changed.
    sorted: Option<Arc<SortedPathIndex>>,
}

pub struct TorrentFileIndex {
    inner: RwLock<Inner>,
    mapped: DashMap<String, Arc<SortedPathIndex>>,
    results: Cache<(String, String), bool>,
}

impl Default for TorrentFileIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TorrentFileIndex {
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_RESULT_CACHE_ENTRIES)
    }

    pub fn with_cache_capacity(max_cached_results: u64) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            mapped: DashMap::new(),
            results: Cache::new(max_cached_results),
        }
    }

    /// Builds the index from a full torrent set.
    pub fn from_torrents<'a, I>(torrents: I, max_cached_results: u64) -> Self
    where
        I: IntoIterator<Item = &'a Torrent>,
    {
        let index = Self::with_cache_capacity(max_cached_results);
        {
            let mut inner = index.write();
            let mut count = 0usize;
            for torrent in torrents {
                Self::insert_locked(&mut inner, torrent);
                count += 1;
            }
            let sorted = SortedPathIndex::new(inner.files.keys().cloned());
            inner.sorted = Some(Arc::new(sorted));
            debug!(
                torrents = count,
                paths = inner.files.len(),
                "Mapped torrents to unique torrent files"
            );
        }
        index
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns whether a new path entered the index.
    fn insert_locked(inner: &mut Inner, torrent: &Torrent) -> bool {
        let shared = Arc::new(torrent.clone());
        let mut new_paths = false;
        for file in &torrent.files {
            let refs = inner.files.entry(file.clone()).or_insert_with(|| {
                new_paths = true;
                HashMap::new()
            });
            refs.insert(torrent.hash.clone(), Arc::clone(&shared));
        }
        new_paths
    }

    /// Called with the write lock held whenever the path set changed.
    fn invalidate_locked(&self, inner: &mut Inner) {
        inner.sorted = None;
        self.mapped.clear();
        self.results.clear();
    }

    /// Registers every file of `torrent`. Adding the same torrent twice is a
    /// no-op the second time.
    pub fn add(&self, torrent: &Torrent) {
        let mut inner = self.write();
        if Self::insert_locked(&mut inner, torrent) {
            self.invalidate_locked(&mut inner);
        }
        trace!(hash = %torrent.hash, files = torrent.files.len(), "Indexed torrent files");
    }

    /// Deregisters `torrent` from each of its files. Paths left without any
    /// torrent are dropped entirely.
    pub fn remove(&self, torrent: &Torrent) {
        let mut inner = self.write();
        let mut dropped_paths = false;
        for file in &torrent.files {
            let Some(refs) = inner.files.get_mut(file) else {
                continue;
            };
            refs.remove(&torrent.hash);
            if refs.is_empty() {
                inner.files.remove(file);
                dropped_paths = true;
            }
        }
        if dropped_paths {
            self.invalidate_locked(&mut inner);
        }
        trace!(hash = %torrent.hash, "Removed torrent files from index");
    }

    /// Drops a single path regardless of which torrents reference it.
    pub fn remove_path(&self, path: &str) {
        let mut inner = self.write();
        if inner.files.remove(path).is_some() {
            self.invalidate_locked(&mut inner);
        }
    }

    /// True iff no file of `torrent` is referenced by more than one torrent.
    pub fn is_unique(&self, torrent: &Torrent) -> bool {
        let inner = self.read();
        torrent
            .files
            .iter()
            .all(|f| inner.files.get(f).map_or(true, |refs| refs.len() <= 1))
    }

    /// True iff no file of `torrent` is present in the index at all.
    pub fn has_no_instances(&self, torrent: &Torrent) -> bool {
        let inner = self.read();
        torrent.files.iter().all(|f| !inner.files.contains_key(f))
    }

    /// Hashes of the torrents referencing `path`, sorted.
    pub fn torrents_for(&self, path: &str) -> Vec<String> {
        let inner = self.read();
        let mut hashes: Vec<String> = inner
            .files
            .get(path)
            .map(|refs| refs.keys().cloned().collect())
            .unwrap_or_default();
        hashes.sort_unstable();
        hashes
    }

    /// Whether `local_path` belongs to any tracked torrent.
    ///
    /// With a non-empty `mapping`, indexed paths are translated first. A
    /// match is a substring occurrence in either direction that starts at
    /// the beginning of a string, on a separator, or right after one: for
    /// `/data/movies/X/file.mkv`, `file.mkv` and `/movies/X` match while
    /// `ovies/X` does not. See [`SortedPathIndex::matches`].
    pub fn contains_path(&self, local_path: &str, mapping: &PathMapping) -> bool {
        let key = (mapping.cache_key().to_string(), local_path.to_string());
        if let Some(found) = self.results.get(&key) {
            return found;
        }

        {
            let inner = self.read();
            if let Some(view) = self.view_locked(&inner, mapping) {
                let found = view.matches(local_path);
                self.results.insert(key, found);
                return found;
            }
        }

        let mut inner = self.write();
        if inner.sorted.is_none() {
            let sorted = SortedPathIndex::new(inner.files.keys().cloned());
            debug!(paths = sorted.len(), "Rebuilt sorted path index");
            inner.sorted = Some(Arc::new(sorted));
        }
        let view = self
            .view_locked(&inner, mapping)
            .unwrap_or_else(|| Arc::new(SortedPathIndex::default()));
        let found = view.matches(local_path);
        self.results.insert(key, found);
        found
    }

    /// The structure to answer a query against, or `None` when the raw
    /// sorted index must be rebuilt first (needs the write lock).
    fn view_locked(&self, inner: &Inner, mapping: &PathMapping) -> Option<Arc<SortedPathIndex>> {
        let sorted = inner.sorted.as_ref()?;
        if mapping.is_empty() {
            return Some(Arc::clone(sorted));
        }

        let view = self
            .mapped
            .entry(mapping.cache_key().to_string())
            .or_insert_with(|| {
                let mapped = SortedPathIndex::new(
                    sorted
                        .as_slice()
                        .iter()
                        .map(|p| mapping.apply(p).into_owned()),
                );
                debug!(
                    paths = mapped.len(),
                    rules = mapping.len(),
                    "Built mapped path index"
                );
                Arc::new(mapped)
            });
        Some(Arc::clone(view.value()))
    }

    /// Drops cached query answers. Never changes query results.
    pub fn clear_cache(&self) {
        let _inner = self.write();
        self.mapped.clear();
        self.results.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.results.stats()
    }

    /// Number of distinct indexed paths.
    pub fn len(&self) -> usize {
        self.read().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
