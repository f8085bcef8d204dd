use moka::sync::Cache as MokaCache;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: u64,
}

/// Bounded, thread-safe result cache.
///
/// Wraps `moka`'s synchronous cache: lock-free reads, TinyLFU eviction once
/// `max_entries` is reached. Entries are an accelerator only; `clear` may be
/// called at any time without affecting correctness of the owner.
pub struct Cache<K, V> {
    inner: MokaCache<K, V>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> Cache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_entries: u64) -> Self {
        Self {
            inner: MokaCache::builder().max_capacity(max_entries).build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a value, counting the hit or miss.
    pub fn get(&self, key: &K) -> Option<V> {
        match self.inner.get(key) {
            Some(value) => {
                trace!("cache hit");
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                trace!("cache miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    /// Drops every entry. Entries inserted before this call are never
    /// returned by a later `get`.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.inner.entry_count(),
        }
    }

    /// Approximate number of entries; pending maintenance is not flushed.
    pub fn len(&self) -> u64 {
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(100_000)
    }
}
