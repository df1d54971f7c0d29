//! Time-bounded, size-bounded key/value cache shared across requests.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Internal cache entry with timestamps
struct CacheEntry<V> {
    data: V,
    cached_at: DateTime<Utc>,
    last_access: DateTime<Utc>,
}

/// A `DashMap` keyed by string where each insert carries its own TTL check on
/// read. When full, expired entries go first, then the least recently read.
///
/// Concurrent misses on the same key may both do the upstream work and both
/// insert; the later write wins.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    capacity: usize,
}

impl<V: Clone> TtlCache<V> {
    /// A capacity of 0 disables caching entirely.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored value if it is younger than `ttl`.
    pub fn get(&self, key: &str, ttl: Duration) -> Option<V> {
        self.get_at(key, ttl, Utc::now())
    }

    pub fn insert(&self, key: impl Into<String>, data: V) {
        self.insert_at(key.into(), data, Utc::now());
    }

    pub(crate) fn get_at(&self, key: &str, ttl: Duration, now: DateTime<Utc>) -> Option<V> {
        let mut entry = self.entries.get_mut(key)?;
        if now - entry.cached_at >= ttl {
            return None;
        }
        entry.last_access = now;
        Some(entry.data.clone())
    }

    pub(crate) fn insert_at(&self, key: String, data: V, now: DateTime<Utc>) {
        if self.capacity == 0 {
            return;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict(now);
        }

        self.entries.insert(
            key,
            CacheEntry {
                data,
                cached_at: now,
                last_access: now,
            },
        );
    }

    fn evict(&self, now: DateTime<Utc>) {
        // Nothing outlives a day in any of the caches.
        let stale_after = Duration::hours(24);
        self.entries.retain(|_, entry| now - entry.cached_at < stale_after);

        while self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().last_access)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}
