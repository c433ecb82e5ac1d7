//! Whisper Bot - webhook ingestion core for a Telegram whisper bot
//!
//! Provides per-user LRU caches with TTL expiration and a fixed-size worker
//! pool that drains webhook updates in FIFO order.

pub mod api;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod pool;
pub mod tasks;

pub use api::AppState;
pub use cache::{BoundedTimedCache, CacheRegistry, ProfilePhotoCache};
pub use config::Config;
pub use dispatch::{NoPhotos, PhotoSource, UpdateDispatcher};
pub use pool::{Handler, WorkerPool};
pub use tasks::spawn_sweep_task;
