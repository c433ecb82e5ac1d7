//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: reclaims expired entries from caches that are rarely read

mod sweep;

pub use sweep::spawn_sweep_task;
