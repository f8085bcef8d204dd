//! Map from on-disk file identity to the torrent paths sharing it.
//!
//! Only downloaded torrents contribute: anything else has no data on disk
//! to link. Paths are translated through the configured [`PathMapping`]
//! before resolution, so buckets hold local paths.

use crate::error::TidyResult;
use crate::identity::{FileIdentity, IdentityResolver, LinkInfo, OsResolver};
use crate::paths::PathMapping;
use crate::types::Torrent;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace, warn};

/// Where a path is registered and which torrents list it.
struct PathEntry {
    identity: FileIdentity,
    owners: HashSet<String>,
}

#[derive(Default)]
struct Inner {
    /// identity -> paths, in insertion order, no duplicates, never empty
    buckets: HashMap<FileIdentity, Vec<String>>,
    /// path -> identity and owning torrent hashes; owners never empty
    by_path: HashMap<String, PathEntry>,
}

impl Inner {
    /// Returns whether `path` entered a bucket it was not in before.
    fn insert(&mut self, path: String, identity: FileIdentity, owner: &str) -> bool {
        if let Some(entry) = self.by_path.get_mut(&path) {
            entry.owners.insert(owner.to_string());
            if entry.identity == identity {
                return false;
            }
            // replaced on disk since it was indexed
            let previous = std::mem::replace(&mut entry.identity, identity);
            self.unlink(&path, &previous);
            self.buckets.entry(identity).or_default().push(path);
            return true;
        }
        self.buckets.entry(identity).or_default().push(path.clone());
        self.by_path.insert(
            path,
            PathEntry {
                identity,
                owners: HashSet::from([owner.to_string()]),
            },
        );
        true
    }

    /// Drops `owner` from `path`; the path leaves its bucket with its last
    /// owner.
    fn release(&mut self, path: &str, owner: &str) {
        let Some(entry) = self.by_path.get_mut(path) else {
            return;
        };
        entry.owners.remove(owner);
        if !entry.owners.is_empty() {
            return;
        }
        let identity = entry.identity;
        self.by_path.remove(path);
        self.unlink(path, &identity);
    }

    fn unlink(&mut self, path: &str, identity: &FileIdentity) {
        if let Some(bucket) = self.buckets.get_mut(identity) {
            bucket.retain(|p| p != path);
            if bucket.is_empty() {
                self.buckets.remove(identity);
            }
        }
    }

    fn bucket_len(&self, identity: &FileIdentity) -> usize {
        self.buckets.get(identity).map_or(0, Vec::len)
    }
}

pub struct HardlinkIndex<R = OsResolver> {
    inner: RwLock<Inner>,
    mapping: PathMapping,
    resolver: R,
}

impl HardlinkIndex<OsResolver> {
    pub fn new(mapping: PathMapping) -> Self {
        Self::with_resolver(mapping, OsResolver)
    }
}

impl<R: IdentityResolver> HardlinkIndex<R> {
    pub fn with_resolver(mapping: PathMapping, resolver: R) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            mapping,
            resolver,
        }
    }

    /// Sequentially indexes every downloaded torrent.
    pub fn from_torrents<'a, I>(torrents: I, mapping: PathMapping, resolver: R) -> Self
    where
        I: IntoIterator<Item = &'a Torrent>,
    {
        let index = Self::with_resolver(mapping, resolver);
        for torrent in torrents {
            index.add_by_torrent(torrent);
        }
        debug!(identities = index.len(), "Built hardlink index");
        index
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mapping(&self) -> &PathMapping {
        &self.mapping
    }

    fn resolve(&self, path: &str) -> TidyResult<LinkInfo> {
        self.resolver.resolve(Path::new(path))
    }

    /// Resolves and registers each file of a downloaded torrent. Files that
    /// fail to resolve are logged and skipped.
    ///
    /// Returns the number of newly registered paths.
    pub fn add_by_torrent(&self, torrent: &Torrent) -> usize {
        if !torrent.downloaded {
            return 0;
        }

        // resolve without holding the lock
        let mut resolved = Vec::with_capacity(torrent.files.len());
        for file in &torrent.files {
            let path = self.mapping.apply(file).into_owned();
            match self.resolve(&path) {
                Ok(info) => resolved.push((path, info.identity)),
                Err(e) => {
                    warn!(
                        operation = "add_by_torrent",
                        hash = %torrent.hash,
                        path = %path,
                        error = %e,
                        "Skipping file that could not be resolved"
                    );
                }
            }
        }

        let mut inner = self.write();
        let added = resolved
            .into_iter()
            .filter(|(path, identity)| inner.insert(path.clone(), *identity, &torrent.hash))
            .count();
        trace!(hash = %torrent.hash, added, "Indexed torrent hardlinks");
        added
    }

    /// Releases the torrent's mapped paths. A path shared with another
    /// tracked torrent stays in its bucket. Needs no OS call, so it also
    /// works after the files are gone.
    pub fn remove_by_torrent(&self, torrent: &Torrent) {
        if !torrent.downloaded {
            return;
        }
        let mut inner = self.write();
        for file in &torrent.files {
            inner.release(&self.mapping.apply(file), &torrent.hash);
        }
    }

    /// Number of indexed paths sharing the identity of `path`.
    ///
    /// Indexed paths are answered from memory; anything else costs one
    /// resolver call made outside the lock.
    fn known_links(&self, path: &str) -> TidyResult<usize> {
        {
            let inner = self.read();
            if let Some(entry) = inner.by_path.get(path) {
                return Ok(inner.bucket_len(&entry.identity));
            }
        }
        let info = self.resolve(path)?;
        Ok(self.read().bucket_len(&info.identity))
    }

    /// True iff no file of the torrent shares its data with another indexed
    /// path. A file that cannot be resolved makes the torrent non-unique.
    pub fn is_torrent_unique(&self, torrent: &Torrent) -> bool {
        if !torrent.downloaded {
            return true;
        }
        torrent.files.iter().all(|file| {
            let path = self.mapping.apply(file);
            match self.known_links(&path) {
                Ok(count) => count <= 1,
                Err(e) => {
                    debug!(path = %path, error = %e, "Treating unresolvable file as shared");
                    false
                }
            }
        })
    }

    /// True iff no file of the torrent has an identity known to the index.
    pub fn has_no_instances(&self, torrent: &Torrent) -> bool {
        if !torrent.downloaded {
            return true;
        }
        torrent.files.iter().all(|file| {
            let path = self.mapping.apply(file);
            match self.known_links(&path) {
                Ok(count) => count == 0,
                Err(e) => {
                    debug!(path = %path, error = %e, "Treating unresolvable file as present");
                    false
                }
            }
        })
    }

    /// True iff some file has more links on disk than the index knows about.
    ///
    /// Always queries the resolver for the live link count. Files that no
    /// longer resolve are skipped.
    pub fn is_hardlinked_outside_client(&self, torrent: &Torrent) -> bool {
        if !torrent.downloaded {
            return false;
        }
        torrent.files.iter().any(|file| {
            let path = self.mapping.apply(file);
            let info = match self.resolve(&path) {
                Ok(info) => info,
                Err(e) => {
                    warn!(
                        operation = "is_hardlinked_outside_client",
                        path = %path,
                        error = %e,
                        "Skipping file that could not be resolved"
                    );
                    return false;
                }
            };
            let known = self.read().bucket_len(&info.identity) as u64;
            if info.links != known {
                debug!(path = %path, links = info.links, known, "Found hardlinks outside client");
                true
            } else {
                false
            }
        })
    }

    /// Paths registered under `identity`, in registration order.
    pub fn paths_for(&self, identity: &FileIdentity) -> Vec<String> {
        self.read()
            .buckets
            .get(identity)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of distinct identities.
    pub fn len(&self) -> usize {
        self.read().buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: IdentityResolver + 'static> HardlinkIndex<R> {
    /// Indexes `torrents` on the blocking pool with at most `workers`
    /// torrents resolving at once. Returns the number of registered paths.
    pub async fn populate(self: &Arc<Self>, torrents: &[Torrent], workers: usize) -> usize {
        let added = stream::iter(torrents.iter().filter(|t| t.downloaded).cloned())
            .map(|torrent| {
                let index = Arc::clone(self);
                tokio::task::spawn_blocking(move || index.add_by_torrent(&torrent))
            })
            .buffer_unordered(workers.max(1))
            .fold(0usize, |total, joined| async move {
                match joined {
                    Ok(added) => total + added,
                    Err(e) => {
                        warn!(error = %e, "Identity resolution task failed");
                        total
                    }
                }
            })
            .await;
        debug!(identities = self.len(), paths = added, "Populated hardlink index");
        added
    }
}
