//! Worker Pool Module
//!
//! Decouples event ingestion from event processing: producers enqueue
//! items, a fixed set of workers drains them in FIFO order.
//!
//! # Backpressure
//! The queue is unbounded by default. A bounded queue rejects new items
//! with [`PoolError::QueueFull`](crate::error::PoolError::QueueFull) rather
//! than blocking the producer.

mod queue;
mod worker;

pub use worker::{handler_fn, Handler, HandlerFn, PoolStats, WorkerPool};
