//! Shared cache handle guarded by a single lock.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::clock::SharedClock;
use crate::cache::{CacheStats, CacheStore};
use crate::error::CacheError;

// == Bounded Timed Cache ==
/// Thread-safe, capacity-bounded LRU cache with a uniform TTL.
///
/// Cloning is cheap and yields another handle to the same storage. Every
/// operation on one instance runs under one exclusive lock; distinct
/// instances never contend.
pub struct BoundedTimedCache<K, V> {
    inner: Arc<Mutex<CacheStore<K, V>>>,
}

impl<K, V> Clone for BoundedTimedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> BoundedTimedCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Creates a cache whose entries expire `ttl` after their last write.
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self, CacheError> {
        CacheStore::new(capacity, Some(ttl)).map(Self::from_store)
    }

    /// Creates a plain LRU cache whose entries never expire.
    pub fn unbounded_ttl(capacity: usize) -> Result<Self, CacheError> {
        CacheStore::new(capacity, None).map(Self::from_store)
    }

    /// Creates a cache on an explicit clock.
    pub fn with_clock(
        capacity: usize,
        ttl: Option<Duration>,
        clock: SharedClock,
    ) -> Result<Self, CacheError> {
        CacheStore::with_clock(capacity, ttl, clock).map(Self::from_store)
    }

    pub(crate) fn from_store(store: CacheStore<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Returns a live value and marks it most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key)
    }

    /// Stores a value as the most recently used entry.
    pub fn set(&self, key: K, value: V) {
        self.inner.lock().set(key, value);
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key)
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        self.inner.lock().cleanup_expired()
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().keys()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.inner.lock().ttl()
    }

    /// True when both handles point at the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.inner.lock().is_consistent()
    }
}

impl<K, V> fmt::Debug for BoundedTimedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedTimedCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use std::thread;

    #[test]
    fn test_clones_share_storage() {
        let cache: BoundedTimedCache<String, u32> =
            BoundedTimedCache::new(4, Duration::from_secs(10)).unwrap();
        let other = cache.clone();

        cache.set("a".to_string(), 1);

        assert_eq!(other.get(&"a".to_string()), Some(1));
        assert!(cache.ptr_eq(&other));
    }

    #[test]
    fn test_unbounded_ttl_has_no_expiry() {
        let cache: BoundedTimedCache<i64, String> = BoundedTimedCache::unbounded_ttl(4).unwrap();
        assert_eq!(cache.ttl(), None);
        assert_eq!(cache.capacity(), 4);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = BoundedTimedCache::<String, String>::new(0, Duration::from_secs(1));
        assert!(matches!(result, Err(CacheError::Capacity)));
    }

    #[test]
    fn test_expiry_through_handle() {
        let clock = Arc::new(ManualClock::new());
        let cache = BoundedTimedCache::with_clock(2, Some(Duration::from_secs(10)), clock.clone())
            .unwrap();

        cache.set("q", vec!["r1", "r2"]);
        clock.advance(Duration::from_secs(9));
        assert_eq!(cache.get(&"q"), Some(vec!["r1", "r2"]));

        clock.advance(Duration::from_secs(10));
        assert_eq!(cache.get(&"q"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_sets_on_distinct_keys() {
        let cache: BoundedTimedCache<String, usize> =
            BoundedTimedCache::new(64, Duration::from_secs(60)).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        cache.set(format!("t{t}-k{i}"), i);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 64);
        assert!(cache.is_consistent());

        let keys = cache.keys();
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }
}
