//! Profile photo cache.
//!
//! Photo file ids rarely change, so entries never expire and only LRU
//! pressure removes them. A user without a photo is cached as `None` so the
//! lookup is not repeated.

use std::fmt::Display;
use std::future::Future;

use tracing::{debug, warn};

use super::BoundedTimedCache;
use crate::error::CacheError;

/// Telegram user id.
pub type UserId = i64;

// == Profile Photo Cache ==
#[derive(Debug, Clone)]
pub struct ProfilePhotoCache {
    cache: BoundedTimedCache<UserId, Option<String>>,
}

impl ProfilePhotoCache {
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        Ok(Self {
            cache: BoundedTimedCache::unbounded_ttl(capacity)?,
        })
    }

    /// Cached photo lookup result for `user_id`.
    ///
    /// `Some(None)` means the user is known to have no photo.
    pub fn get(&self, user_id: UserId) -> Option<Option<String>> {
        self.cache.get(&user_id)
    }

    pub fn set(&self, user_id: UserId, file_id: Option<String>) {
        self.cache.set(user_id, file_id);
    }

    // == Get Or Fetch ==
    /// Returns the cached photo of `user_id`, calling `fetch` on a miss.
    ///
    /// Whatever the lookup yields is cached, including "no photo". A failed
    /// lookup is logged and cached as `None` as well.
    pub async fn get_or_fetch<F, Fut, E>(&self, user_id: UserId, fetch: F) -> Option<String>
    where
        F: FnOnce(UserId) -> Fut,
        Fut: Future<Output = Result<Option<String>, E>>,
        E: Display,
    {
        if let Some(cached) = self.cache.get(&user_id) {
            return cached;
        }

        let photo = match fetch(user_id).await {
            Ok(photo) => photo,
            Err(e) => {
                warn!(user_id, error = %e, "Profile photo lookup failed");
                None
            }
        };

        debug!(user_id, found = photo.is_some(), "Caching profile photo");
        self.cache.set(user_id, photo.clone());
        photo
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fetch_called_once_per_user() {
        let cache = ProfilePhotoCache::new(100).unwrap();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let photo = cache
                .get_or_fetch(42, |id| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Ok::<_, String>(Some(format!("file-{id}"))) }
                })
                .await;
            assert_eq!(photo.as_deref(), Some("file-42"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_photo_is_cached() {
        let cache = ProfilePhotoCache::new(100).unwrap();

        let photo = cache
            .get_or_fetch(7, |_| async { Ok::<_, String>(None) })
            .await;

        assert_eq!(photo, None);
        assert_eq!(cache.get(7), Some(None));
    }

    #[tokio::test]
    async fn test_failed_lookup_is_cached_as_none() {
        let cache = ProfilePhotoCache::new(100).unwrap();

        let photo = cache
            .get_or_fetch(9, |_| async { Err::<Option<String>, _>("timeout") })
            .await;

        assert_eq!(photo, None);
        assert_eq!(cache.get(9), Some(None));
    }

    #[test]
    fn test_lru_bound_applies() {
        let cache = ProfilePhotoCache::new(2).unwrap();

        cache.set(1, Some("a".to_string()));
        cache.set(2, Some("b".to_string()));
        cache.set(3, None);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1), None);
    }
}
