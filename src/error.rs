//! Error types for the bot core
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised while building a cache.
///
/// Reads and writes never fail; a miss is `None`, not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Cache constructed with a capacity of zero
    #[error("Cache capacity must be greater than zero")]
    Capacity,
}

// == Pool Error Enum ==
/// Errors returned by the worker pool to whoever enqueues or starts it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Bounded queue is at capacity, the item was rejected
    #[error("Queue full: capacity {0} reached")]
    QueueFull(usize),

    /// Pool has been shut down and accepts no more items
    #[error("Worker pool is closed")]
    Closed,

    /// `start` was called on a pool that already has workers
    #[error("Worker pool already started")]
    AlreadyStarted,

    /// `start` was called with zero workers
    #[error("Worker count must be greater than zero")]
    NoWorkers,
}

// == Handler Error ==
/// Failure reported by a pool handler for a single item.
///
/// Workers log these and drop the item; they never reach the enqueuer.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Update carried no payload the dispatcher understands
    #[error("Unsupported update {0}: no recognised payload")]
    Unsupported(i64),

    /// Handler panicked while processing an item
    #[error("Handler panicked: {0}")]
    Panicked(String),

    /// Any other failure surfaced by application code
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// == API Error Enum ==
/// Errors surfaced by the HTTP ingestion layer.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body could not be decoded
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Update could not be queued
    #[error(transparent)]
    Pool(#[from] PoolError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP layer.
pub type Result<T> = std::result::Result<T, ApiError>;
