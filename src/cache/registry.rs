//! Per-identity cache registry.
//!
//! Hands every user their own [`BoundedTimedCache`], created on first use
//! with the registry's fixed capacity and TTL and kept for the lifetime of
//! the registry.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;

use super::clock::{system_clock, SharedClock};
use super::{BoundedTimedCache, CacheStats, CacheStore};
use crate::error::CacheError;

/// Cache owned by a single identity, keyed by lookup string.
pub type IdentityCache<V> = BoundedTimedCache<String, V>;

// == Cache Registry ==
/// Lazily populated map from identity to that identity's cache.
///
/// Cloning is cheap; clones share the same set of caches. The registry
/// lock only guards lookup and create-if-absent, never cache operations.
pub struct CacheRegistry<V> {
    caches: Arc<RwLock<HashMap<String, IdentityCache<V>>>>,
    capacity: NonZeroUsize,
    ttl: Option<Duration>,
    clock: SharedClock,
}

impl<V> Clone for CacheRegistry<V> {
    fn clone(&self) -> Self {
        Self {
            caches: Arc::clone(&self.caches),
            capacity: self.capacity,
            ttl: self.ttl,
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<V: Clone> CacheRegistry<V> {
    /// Creates an empty registry whose caches hold `capacity` entries for
    /// `ttl` each (`None` for no expiry).
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Result<Self, CacheError> {
        Self::with_clock(capacity, ttl, system_clock())
    }

    pub fn with_clock(
        capacity: usize,
        ttl: Option<Duration>,
        clock: SharedClock,
    ) -> Result<Self, CacheError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(CacheError::Capacity)?;

        Ok(Self {
            caches: Arc::new(RwLock::new(HashMap::new())),
            capacity,
            ttl,
            clock,
        })
    }

    // == Cache For ==
    /// Returns the cache of `identity`, creating it if absent.
    ///
    /// Concurrent first accesses for one identity all observe the same
    /// instance: creation happens under the write lock and re-checks for a
    /// winner first.
    pub fn cache_for(&self, identity: &str) -> IdentityCache<V> {
        if let Some(cache) = self.caches.read().get(identity) {
            return cache.clone();
        }

        let mut caches = self.caches.write();
        caches
            .entry(identity.to_string())
            .or_insert_with(|| {
                debug!(identity, capacity = self.capacity.get(), "Creating identity cache");
                BoundedTimedCache::from_store(CacheStore::from_parts(
                    self.capacity,
                    self.ttl,
                    Arc::clone(&self.clock),
                ))
            })
            .clone()
    }

    /// Looks up `key` in the cache of `identity`.
    pub fn get_cached_value(&self, identity: &str, key: &str) -> Option<V> {
        self.cache_for(identity).get(&key.to_string())
    }

    /// Stores `value` under `key` in the cache of `identity`.
    pub fn set_cached_value(&self, identity: &str, key: &str, value: V) {
        self.cache_for(identity).set(key.to_string(), value);
    }

    // == Cleanup Expired ==
    /// Sweeps expired entries from every registered cache.
    ///
    /// Handles are copied out first so the registry lock is released before
    /// any cache lock is taken.
    pub fn cleanup_expired(&self) -> usize {
        self.snapshot()
            .iter()
            .map(|cache| cache.cleanup_expired())
            .sum()
    }

    /// Aggregated statistics over every identity.
    pub fn stats(&self) -> CacheStats {
        let mut total = CacheStats::new();
        for cache in self.snapshot() {
            total += &cache.stats();
        }
        total
    }

    /// Number of identities that own a cache.
    pub fn len(&self) -> usize {
        self.caches.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.read().is_empty()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.caches.read().contains_key(identity)
    }

    fn snapshot(&self) -> Vec<IdentityCache<V>> {
        self.caches.read().values().cloned().collect()
    }
}

impl<V> fmt::Debug for CacheRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("identities", &self.caches.read().len())
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use std::sync::Barrier;
    use std::thread;

    const TTL: Duration = Duration::from_secs(10);

    #[test]
    fn test_registry_rejects_zero_capacity() {
        let result = CacheRegistry::<String>::new(0, Some(TTL));
        assert!(matches!(result, Err(CacheError::Capacity)));
    }

    #[test]
    fn test_caches_created_lazily() {
        let registry: CacheRegistry<Vec<String>> = CacheRegistry::new(100, Some(TTL)).unwrap();
        assert!(registry.is_empty());

        assert_eq!(registry.get_cached_value("user123", "test query"), None);
        assert!(registry.contains("user123"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_identities_are_isolated() {
        let registry = CacheRegistry::new(100, Some(TTL)).unwrap();

        registry.set_cached_value("alice", "q", vec!["a"]);
        registry.set_cached_value("bob", "q", vec!["b"]);

        assert_eq!(registry.get_cached_value("alice", "q"), Some(vec!["a"]));
        assert_eq!(registry.get_cached_value("bob", "q"), Some(vec!["b"]));
        assert_eq!(registry.get_cached_value("carol", "q"), None);
    }

    #[test]
    fn test_cache_for_returns_same_instance() {
        let registry: CacheRegistry<u8> = CacheRegistry::new(4, Some(TTL)).unwrap();

        let first = registry.cache_for("alice");
        let second = registry.cache_for("alice");

        assert!(first.ptr_eq(&second));
        assert_eq!(first.capacity(), 4);
        assert_eq!(first.ttl(), Some(TTL));
    }

    #[test]
    fn test_concurrent_first_access_creates_one_cache() {
        let registry: CacheRegistry<u32> = CacheRegistry::new(8, Some(TTL)).unwrap();
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = registry.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let cache = registry.cache_for("same-user");
                    cache.set(format!("k{i}"), i);
                    cache
                })
            })
            .collect();

        let caches: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(registry.len(), 1);
        assert!(caches.iter().all(|c| c.ptr_eq(&caches[0])));
        assert_eq!(registry.cache_for("same-user").len(), 8);
    }

    #[test]
    fn test_values_expire_per_ttl() {
        let clock = Arc::new(ManualClock::new());
        let registry = CacheRegistry::with_clock(100, Some(TTL), clock.clone()).unwrap();

        registry.set_cached_value("user123", "test query", "result1".to_string());
        clock.advance(Duration::from_secs(9));
        assert!(registry.get_cached_value("user123", "test query").is_some());

        clock.advance(Duration::from_secs(2));
        assert_eq!(registry.get_cached_value("user123", "test query"), None);
    }

    #[test]
    fn test_cleanup_and_stats_span_all_identities() {
        let clock = Arc::new(ManualClock::new());
        let registry = CacheRegistry::with_clock(100, Some(TTL), clock.clone()).unwrap();

        registry.set_cached_value("a", "q1", 1);
        registry.set_cached_value("b", "q1", 2);
        clock.advance(Duration::from_secs(5));
        registry.set_cached_value("b", "q2", 3);
        clock.advance(Duration::from_secs(6));

        assert_eq!(registry.cleanup_expired(), 2);

        let stats = registry.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.expirations, 2);
        assert_eq!(registry.len(), 2);
    }
}
