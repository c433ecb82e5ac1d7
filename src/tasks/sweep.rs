//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from every
//! cache of a registry. Reads already expire entries lazily; the sweep only
//! reclaims memory held by identities that stopped querying.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::CacheRegistry;

/// Spawns a task that sweeps `registry` every `interval` until `token` is
/// cancelled.
///
/// # Example
/// ```ignore
/// let token = CancellationToken::new();
/// let handle = spawn_sweep_task(registry.clone(), Duration::from_secs(60), token.clone());
/// // Later, during shutdown:
/// token.cancel();
/// handle.await?;
/// ```
pub fn spawn_sweep_task<V>(
    registry: CacheRegistry<V>,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs_f64(), "Starting expiry sweep task");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Expiry sweep task stopped");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let removed = registry.cleanup_expired();
            if removed > 0 {
                info!(removed, identities = registry.len(), "Expiry sweep removed entries");
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_sweep_removes_expired_entries() {
        let clock = Arc::new(ManualClock::new());
        let registry = CacheRegistry::with_clock(100, Some(TTL), clock.clone()).unwrap();

        registry.set_cached_value("user", "stale", 1u32);
        clock.advance(TTL);
        registry.set_cached_value("user", "fresh", 2u32);

        let token = CancellationToken::new();
        let handle = spawn_sweep_task(registry.clone(), Duration::from_millis(10), token.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;

        let stats = registry.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.expirations, 1);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_preserves_valid_entries() {
        let registry = CacheRegistry::new(100, Some(Duration::from_secs(3600))).unwrap();
        registry.set_cached_value("user", "long_lived", "value".to_string());

        let token = CancellationToken::new();
        let handle = spawn_sweep_task(registry.clone(), Duration::from_millis(10), token.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(
            registry.get_cached_value("user", "long_lived").as_deref(),
            Some("value")
        );

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_task_stops_on_cancel() {
        let registry: CacheRegistry<u8> = CacheRegistry::new(10, Some(TTL)).unwrap();
        let token = CancellationToken::new();

        let handle = spawn_sweep_task(registry, Duration::from_secs(3600), token.clone());
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweep task should stop promptly")
            .unwrap();
    }
}
