//! API Module
//!
//! HTTP handlers and routing for the webhook ingestion surface.
//!
//! # Endpoints
//! - `POST /webhook` - Queue a Telegram update
//! - `GET /status` - Server, queue and cache status
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
