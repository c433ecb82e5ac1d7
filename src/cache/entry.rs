//! Cache Entry Module
//!
//! Defines a stored value together with the instant it was written.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cache entry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant of insertion or last refresh
    pub created_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    pub fn new(value: V, created_at: Instant) -> Self {
        Self { value, created_at }
    }

    // == Is Expired ==
    /// Checks whether the entry is stale at `now`.
    ///
    /// The entry stays visible while `now - created_at < ttl`, so it expires
    /// the moment the full TTL has elapsed. A `None` TTL never expires.
    pub fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        match ttl {
            Some(ttl) => now.saturating_duration_since(self.created_at) >= ttl,
            None => false,
        }
    }
}
