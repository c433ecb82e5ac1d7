//! Cache Module
//!
//! Capacity-bounded LRU caches with lazy TTL expiration, a per-identity
//! registry of such caches, and the profile photo cache.

mod clock;
mod entry;
mod lru;
mod photo;
mod registry;
mod stats;
mod store;
mod timed;


// Re-export public types
pub use clock::{system_clock, Clock, ManualClock, SharedClock, SystemClock};
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use photo::{ProfilePhotoCache, UserId};
pub use registry::{CacheRegistry, IdentityCache};
pub use stats::CacheStats;
pub use store::CacheStore;
pub use timed::BoundedTimedCache;
