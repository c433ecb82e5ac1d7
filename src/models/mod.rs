//! Request and Response models for the webhook server
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! deserializing incoming updates and serializing HTTP responses.

pub mod responses;
pub mod update;

// Re-export commonly used types
pub use responses::{HealthResponse, StatusResponse};
pub use update::{CallbackQuery, Chat, InlineQuery, Message, Update, UpdateKind, User};
