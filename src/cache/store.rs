//! Cache Store Module
//!
//! Unlocked cache engine combining HashMap storage with LRU tracking and
//! lazy TTL expiration. Callers provide the synchronisation; see
//! [`BoundedTimedCache`](crate::cache::BoundedTimedCache) for the shared
//! variant.

use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::Duration;

use tracing::trace;

use crate::cache::clock::{system_clock, SharedClock};
use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::error::CacheError;

// == Cache Store ==
/// Fixed-capacity LRU storage where every entry shares one TTL.
#[derive(Debug)]
pub struct CacheStore<K, V> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker<K>,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of live entries
    capacity: usize,
    /// Lifetime of every entry; None disables expiry
    ttl: Option<Duration>,
    clock: SharedClock,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a store on the system clock.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, must be non-zero
    /// * `ttl` - Lifetime applied to every entry, `None` for no expiry
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Result<Self, CacheError> {
        Self::with_clock(capacity, ttl, system_clock())
    }

    /// Creates a store that reads time from `clock`.
    pub fn with_clock(
        capacity: usize,
        ttl: Option<Duration>,
        clock: SharedClock,
    ) -> Result<Self, CacheError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(CacheError::Capacity)?;
        Ok(Self::from_parts(capacity, ttl, clock))
    }

    /// Creates a store from an already validated capacity.
    pub(crate) fn from_parts(
        capacity: NonZeroUsize,
        ttl: Option<Duration>,
        clock: SharedClock,
    ) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.get()),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            capacity: capacity.get(),
            ttl,
            clock,
        }
    }

    // == Set ==
    /// Stores a value, making `key` the most recently used.
    ///
    /// An existing key is replaced and its age reset. A new key inserted
    /// into a full store evicts exactly one entry, the least recently used.
    pub fn set(&mut self, key: K, value: V) {
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.capacity {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                self.stats.record_eviction();
                trace!(capacity = self.capacity, "Evicted least recently used entry");
            }
        }

        let entry = CacheEntry::new(value, self.clock.now());
        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);

        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a live value and marks it most recently used.
    ///
    /// An expired entry is removed on the spot and reported as a miss.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let Some(entry) = self.entries.get(key) else {
            self.stats.record_miss();
            return None;
        };

        if self.ttl.is_some() && entry.is_expired(self.ttl, self.clock.now()) {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            return None;
        }

        let value = entry.value.clone();
        self.lru.touch(key);
        self.stats.record_hit();
        Some(value)
    }

    // == Remove ==
    /// Drops an entry, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.stats.set_total_entries(self.entries.len());
        Some(entry.value)
    }

    // == Cleanup Expired ==
    /// Removes every expired entry. Returns how many were dropped.
    ///
    /// Always 0 for stores without a TTL.
    pub fn cleanup_expired(&mut self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let now = self.clock.now();
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(self.ttl, now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_expirations(expired.len());
        self.stats.set_total_entries(self.entries.len());
        expired.len()
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<K> {
        self.lru.iter().cloned().collect()
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Checks that storage and recency tracking agree.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.entries.len() == self.lru.len()
            && self.entries.len() <= self.capacity
            && self.lru.iter().all(|key| self.entries.contains_key(key))
    }
}
