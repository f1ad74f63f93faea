//! In-process TTL cache backed by DashMap for lock-free concurrent access.
//! Holds derived, recomputable values (group priors, baselines, model blobs).
//!
//! Semantics are "read, and overwrite if stale": concurrent misses may each
//! recompute and `put` the same key. The last write wins.

use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug, PartialEq)]
enum Lookup<V> {
    Hit(V),
    Miss,
    Expired,
}

/// Lock-free local cache with a per-entry time-to-live.
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    store: DashMap<K, CacheEntry<V>>,
    max_entries: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: DashMap::new(),
            max_entries,
        }
    }

    /// Get a value, returns None if expired or missing.
    /// An expired entry counts as both expired and a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        match self.lookup(key) {
            Lookup::Hit(value) => {
                metrics::counter!("pulse.cache.hit").increment(1);
                Some(value)
            }
            Lookup::Expired => {
                metrics::counter!("pulse.cache.expired").increment(1);
                metrics::counter!("pulse.cache.miss").increment(1);
                None
            }
            Lookup::Miss => {
                metrics::counter!("pulse.cache.miss").increment(1);
                None
            }
        }
    }

    fn lookup(&self, key: &K) -> Lookup<V> {
        let Some(entry) = self.store.get(key) else {
            return Lookup::Miss;
        };
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.store.remove(key);
            return Lookup::Expired;
        }
        Lookup::Hit(entry.value.clone())
    }

    /// Insert or overwrite a value that lives for `ttl`.
    pub fn put(&self, key: K, value: V, ttl: Duration) {
        if self.store.len() >= self.max_entries && !self.store.contains_key(&key) {
            self.evict_expired();
            if self.store.len() >= self.max_entries {
                metrics::counter!("pulse.cache.rejected").increment(1);
                return;
            }
        }
        self.store.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Return the cached value or compute, store and return a fresh one.
    pub fn get_or_insert_with<E, F>(&self, key: K, ttl: Duration, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.put(key, value.clone(), ttl);
        Ok(value)
    }

    pub fn invalidate(&self, key: &K) {
        self.store.remove(key);
    }

    /// Remove expired entries.
    pub fn evict_expired(&self) -> usize {
        let before = self.store.len();
        let now = Instant::now();
        self.store.retain(|_, entry| entry.expires_at > now);
        before - self.store.len()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(10_000)
    }
}
