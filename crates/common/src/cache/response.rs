//! Bounded LRU response cache

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

/// Hit and miss counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Least-recently-used store keyed by request fingerprint.
///
/// A size of zero builds a disabled cache: `get` always misses and `put`
/// discards.
pub struct ResponseCache<V> {
    entries: Option<Mutex<LruCache<String, V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(max_size).map(|cap| Mutex::new(LruCache::new(cap))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn disabled() -> Self {
        Self::new(0)
    }

    pub const fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Looks up an entry and marks it most recently used.
    pub fn get(&self, key: &str) -> Option<V> {
        let value = self.entries.as_ref().and_then(|entries| entries.lock().get(key).cloned());
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    pub fn put(&self, key: String, value: V) {
        if let Some(entries) = &self.entries {
            if let Some((evicted, _)) = entries.lock().push(key, value) {
                trace!(fingerprint = %evicted, "response cache evicted entry");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.lock().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<V> std::fmt::Debug for ResponseCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("enabled", &self.entries.is_some())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
