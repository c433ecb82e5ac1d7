//! API Handlers
//!
//! HTTP request handlers for the webhook ingestion endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, warn};

use crate::cache::{CacheRegistry, ProfilePhotoCache};
use crate::config::Config;
use crate::dispatch::{NoPhotos, PhotoSource, UpdateDispatcher};
use crate::error::{ApiError, CacheError, Result};
use crate::models::{HealthResponse, StatusResponse, Update};
use crate::pool::WorkerPool;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Pool the webhook feeds updates into
    pub pool: Arc<WorkerPool<Update>>,
    /// Handler run by the pool, kept here for its cache statistics
    pub dispatcher: UpdateDispatcher,
}

impl AppState {
    pub fn new(pool: Arc<WorkerPool<Update>>, dispatcher: UpdateDispatcher) -> Self {
        Self { pool, dispatcher }
    }

    /// Creates an AppState from configuration, with no profile photo source.
    ///
    /// The pool is created but not started.
    pub fn from_config(config: &Config) -> std::result::Result<Self, CacheError> {
        Self::with_photo_source(config, Arc::new(NoPhotos))
    }

    /// Creates an AppState whose dispatcher resolves receiver photos
    /// through `photo_source`.
    pub fn with_photo_source(
        config: &Config,
        photo_source: Arc<dyn PhotoSource>,
    ) -> std::result::Result<Self, CacheError> {
        let inline_cache =
            CacheRegistry::new(config.inline_cache_capacity, Some(config.inline_ttl()))?;
        let photos = ProfilePhotoCache::new(config.photo_cache_capacity)?;
        let dispatcher = UpdateDispatcher::new(inline_cache, photos, photo_source);
        let pool = WorkerPool::with_queue_capacity(config.queue_capacity);
        Ok(Self::new(Arc::new(pool), dispatcher))
    }
}

/// Handler for POST /webhook
///
/// Queues the update for the workers and answers immediately; processing
/// failures are never reported back to Telegram.
pub async fn webhook_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Update>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(update) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Rejected webhook payload");
        ApiError::InvalidRequest(rejection.body_text())
    })?;

    debug!(update_id = update.update_id, kind = ?update.kind(), "Received update");

    state.pool.enqueue(update).map_err(|e| {
        warn!(error = %e, "Failed to queue update");
        ApiError::from(e)
    })?;

    Ok(StatusCode::OK)
}

/// Handler for GET /status
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse::running(
        state.pool.stats(),
        state.dispatcher.inline_cache().stats(),
        state.dispatcher.photos().len(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn test_state(queue_capacity: Option<NonZeroUsize>) -> AppState {
        let config = Config {
            queue_capacity,
            ..Config::default()
        };
        AppState::from_config(&config).unwrap()
    }

    fn update(update_id: i64) -> Update {
        serde_json::from_value(serde_json::json!({ "update_id": update_id })).unwrap()
    }

    #[tokio::test]
    async fn test_webhook_enqueues_update() {
        let state = test_state(None);

        let status = webhook_handler(State(state.clone()), Ok(Json(update(1))))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.pool.queue_len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_queue_full() {
        let state = test_state(NonZeroUsize::new(1));

        webhook_handler(State(state.clone()), Ok(Json(update(1))))
            .await
            .unwrap();
        let result = webhook_handler(State(state), Ok(Json(update(2)))).await;

        assert!(matches!(
            result,
            Err(ApiError::Pool(crate::error::PoolError::QueueFull(1)))
        ));
    }

    #[tokio::test]
    async fn test_status_handler_reports_queue() {
        let state = test_state(None);
        state.pool.enqueue(update(1)).unwrap();
        state.pool.enqueue(update(2)).unwrap();

        state.dispatcher.photos().set(42, None);

        let response = status_handler(State(state)).await;
        assert_eq!(response.status, "running");
        assert_eq!(response.queue_size, 2);
        assert_eq!(response.photo_cache_size, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
