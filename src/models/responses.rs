//! Response DTOs for the ingestion API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::pool::PoolStats;

/// Response body for the status endpoint (GET /status)
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Always "running" while the server answers
    pub status: String,
    /// Updates waiting for a worker
    pub queue_size: usize,
    /// Worker counters
    pub pool: PoolStats,
    /// Inline-query cache counters summed over all users
    pub inline_cache: CacheStats,
    /// Users with a cached profile photo lookup
    pub photo_cache_size: usize,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl StatusResponse {
    pub fn running(pool: PoolStats, inline_cache: CacheStats, photo_cache_size: usize) -> Self {
        Self {
            status: "running".to_string(),
            queue_size: pool.queued,
            pool,
            inline_cache,
            photo_cache_size,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
