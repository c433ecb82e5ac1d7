//! Configuration Module
//!
//! Handles loading and managing bot configuration from environment variables.

use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

/// Bot configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Number of workers draining the update queue
    pub worker_count: usize,
    /// Queue bound; None keeps the queue unbounded
    pub queue_capacity: Option<NonZeroUsize>,
    /// Entries per user in the inline-query cache
    pub inline_cache_capacity: usize,
    /// Lifetime of an inline-query cache entry in seconds
    pub inline_cache_ttl: u64,
    /// Entries in the profile photo cache
    pub photo_cache_capacity: usize,
    /// Seconds between expiry sweeps; 0 disables the sweep
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port (default: 5000)
    /// - `WORKER_COUNT` - Update workers (default: 5)
    /// - `QUEUE_CAPACITY` - Queue bound, 0 or unset for unbounded
    /// - `INLINE_CACHE_CAPACITY` - Per-user inline cache size (default: 100)
    /// - `INLINE_CACHE_TTL` - Inline cache TTL in seconds (default: 10)
    /// - `PHOTO_CACHE_CAPACITY` - Profile photo cache size (default: 100)
    /// - `SWEEP_INTERVAL` - Expiry sweep period in seconds (default: 0, off)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: parse_var("PORT").unwrap_or(defaults.server_port),
            worker_count: parse_var("WORKER_COUNT").unwrap_or(defaults.worker_count),
            queue_capacity: parse_var::<usize>("QUEUE_CAPACITY").and_then(NonZeroUsize::new),
            inline_cache_capacity: parse_var("INLINE_CACHE_CAPACITY")
                .unwrap_or(defaults.inline_cache_capacity),
            inline_cache_ttl: parse_var("INLINE_CACHE_TTL").unwrap_or(defaults.inline_cache_ttl),
            photo_cache_capacity: parse_var("PHOTO_CACHE_CAPACITY")
                .unwrap_or(defaults.photo_cache_capacity),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
        }
    }

    pub fn inline_ttl(&self) -> Duration {
        Duration::from_secs(self.inline_cache_ttl)
    }

    /// Sweep period, or None when sweeping is disabled.
    pub fn sweep_period(&self) -> Option<Duration> {
        (self.sweep_interval > 0).then(|| Duration::from_secs(self.sweep_interval))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 5000,
            worker_count: 5,
            queue_capacity: None,
            inline_cache_capacity: 100,
            inline_cache_ttl: 10,
            photo_cache_capacity: 100,
            sweep_interval: 0,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 5000);
        assert_eq!(config.worker_count, 5);
        assert_eq!(config.queue_capacity, None);
        assert_eq!(config.inline_cache_capacity, 100);
        assert_eq!(config.inline_ttl(), Duration::from_secs(10));
        assert_eq!(config.photo_cache_capacity, 100);
        assert_eq!(config.sweep_period(), None);
    }

    // Single test touching the environment so parallel tests don't race
    #[test]
    fn test_config_from_env() {
        let vars = [
            "PORT",
            "WORKER_COUNT",
            "QUEUE_CAPACITY",
            "INLINE_CACHE_CAPACITY",
            "INLINE_CACHE_TTL",
            "PHOTO_CACHE_CAPACITY",
            "SWEEP_INTERVAL",
        ];
        for var in vars {
            env::remove_var(var);
        }
        assert_eq!(Config::from_env(), Config::default());

        env::set_var("WORKER_COUNT", "8");
        env::set_var("QUEUE_CAPACITY", "256");
        env::set_var("INLINE_CACHE_TTL", "not-a-number");
        env::set_var("SWEEP_INTERVAL", "30");

        let config = Config::from_env();
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.queue_capacity, NonZeroUsize::new(256));
        assert_eq!(config.inline_cache_ttl, 10);
        assert_eq!(config.sweep_period(), Some(Duration::from_secs(30)));

        env::set_var("QUEUE_CAPACITY", "0");
        assert_eq!(Config::from_env().queue_capacity, None);

        for var in vars {
            env::remove_var(var);
        }
    }
}
