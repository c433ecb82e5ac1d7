//! Worker Pool
//!
//! Fixed set of tokio tasks draining one ingestion queue and handing each
//! item to an application handler.

use std::future::Future;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{self, FutureExt};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::queue::{Consumer, Message, WorkQueue};
use crate::error::{HandlerError, PoolError};

// == Handler Trait ==
/// Processes one dequeued item.
///
/// Implementations are treated as opaque: they may have side effects and
/// are not assumed idempotent. Errors are logged by the worker and the item
/// is dropped.
pub trait Handler<T>: Send + Sync + 'static {
    fn handle(&self, item: T) -> impl Future<Output = Result<(), HandlerError>> + Send;
}

/// Handler built from an async closure. See [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wraps `f` so it can be passed to [`WorkerPool::start`].
pub fn handler_fn<T, F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    HandlerFn { f }
}

impl<T, F, Fut> Handler<T> for HandlerFn<F>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    fn handle(&self, item: T) -> impl Future<Output = Result<(), HandlerError>> + Send {
        (self.f)(item)
    }
}

// == Pool Stats ==
#[derive(Debug, Default)]
struct Counters {
    processed: AtomicU64,
    failed: AtomicU64,
}

/// Snapshot of what the workers have done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Items the handler completed successfully
    pub processed: u64,
    /// Items dropped after a handler error or panic
    pub failed: u64,
    /// Items waiting in the queue
    pub queued: usize,
    /// Workers currently running
    pub workers: usize,
}

// == Worker Pool ==
/// Dispatches queued items to a fixed number of concurrent workers.
///
/// Dequeue order is FIFO across the whole pool; completion order is not,
/// since items taken by different workers run concurrently. Delivery is at
/// most once: a failed item is never retried.
pub struct WorkerPool<T> {
    queue: WorkQueue<T>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    /// Set by shutdown; guards enqueue so no item lands behind a stop marker
    closed: RwLock<bool>,
    counters: Arc<Counters>,
    token: CancellationToken,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Creates a pool with an unbounded queue.
    pub fn new() -> Self {
        Self::with_queue_capacity(None)
    }

    /// Creates a pool whose queue holds at most `capacity` items.
    pub fn bounded(capacity: NonZeroUsize) -> Self {
        Self::with_queue_capacity(Some(capacity))
    }

    pub fn with_queue_capacity(capacity: Option<NonZeroUsize>) -> Self {
        Self::with_cancellation(capacity, CancellationToken::new())
    }

    /// Creates a pool whose workers also exit when `token` is cancelled.
    pub fn with_cancellation(capacity: Option<NonZeroUsize>, token: CancellationToken) -> Self {
        Self {
            queue: WorkQueue::new(capacity),
            workers: Mutex::new(Vec::new()),
            closed: RwLock::new(false),
            counters: Arc::new(Counters::default()),
            token,
        }
    }

    // == Enqueue ==
    /// Adds `item` to the tail of the queue. Never blocks.
    ///
    /// Fails only when the pool is shut down or a bounded queue is full.
    pub fn enqueue(&self, item: T) -> Result<(), PoolError> {
        let closed = self.closed.read();
        if *closed {
            return Err(PoolError::Closed);
        }
        self.queue.push(item)
    }

    // == Start ==
    /// Spawns `worker_count` workers that feed items to `handler`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<H>(&self, worker_count: usize, handler: H) -> Result<(), PoolError>
    where
        H: Handler<T>,
    {
        if worker_count == 0 {
            return Err(PoolError::NoWorkers);
        }
        if *self.closed.read() {
            return Err(PoolError::Closed);
        }

        let mut workers = self.workers.lock();
        if !workers.is_empty() {
            return Err(PoolError::AlreadyStarted);
        }

        let handler = Arc::new(handler);
        for id in 0..worker_count {
            let worker = Worker {
                id,
                consumer: self.queue.consumer(),
                handler: Arc::clone(&handler),
                counters: Arc::clone(&self.counters),
                token: self.token.clone(),
            };
            workers.push(tokio::spawn(worker.run()));
        }

        info!(
            workers = worker_count,
            queue_capacity = ?self.queue.capacity(),
            "Worker pool started"
        );
        Ok(())
    }

    // == Shutdown ==
    /// Stops accepting items, lets the queue drain and waits for every
    /// worker to exit.
    ///
    /// One stop marker per worker is queued behind the pending items, so
    /// everything enqueued before this call is still handled.
    ///
    /// Draining needs workers. On a pool that was never started, or whose
    /// workers were stopped with [`cancel`](Self::cancel), the pool is only
    /// closed and items still queued stay unprocessed; they remain visible
    /// through [`queue_len`](Self::queue_len).
    pub async fn shutdown(&self) {
        *self.closed.write() = true;

        let handles = std::mem::take(&mut *self.workers.lock());
        if handles.is_empty() {
            warn!(queued = self.queue.len(), "Shutdown on a pool with no workers");
            return;
        }

        // Cancelled workers no longer drain, so a full bounded queue would
        // never make room for the markers
        for _ in 0..handles.len() {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                result = self.queue.push_stop() => {
                    if let Err(e) = result {
                        warn!(error = %e, "Failed to queue stop marker");
                    }
                }
            }
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task ended abnormally");
            }
        }

        info!(
            processed = self.counters.processed.load(Ordering::Relaxed),
            failed = self.counters.failed.load(Ordering::Relaxed),
            abandoned = self.queue.len(),
            "Worker pool shut down"
        );
    }

    /// Tells workers to exit after their current item, without draining.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Number of items waiting to be picked up.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.read()
    }

    pub fn stats(&self) -> PoolStats {
        let workers = self
            .workers
            .lock()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count();

        PoolStats {
            processed: self.counters.processed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            queued: self.queue.len(),
            workers,
        }
    }
}

impl<T: Send + 'static> Default for WorkerPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

// == Worker ==
struct Worker<T, H> {
    id: usize,
    consumer: Consumer<T>,
    handler: Arc<H>,
    counters: Arc<Counters>,
    token: CancellationToken,
}

impl<T, H> Worker<T, H>
where
    T: Send + 'static,
    H: Handler<T>,
{
    async fn run(self) {
        debug!(worker = self.id, "Worker started");

        loop {
            let message = tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    debug!(worker = self.id, "Worker cancelled");
                    break;
                }
                message = self.consumer.recv() => message,
            };

            match message {
                Some(Message::Item(item)) => self.process(item).await,
                Some(Message::Stop) | None => break,
            }
        }

        debug!(worker = self.id, "Worker stopped");
    }

    /// Runs the handler on one item. Errors and panics are contained here.
    async fn process(&self, item: T) {
        // Built inside the guard so a panic before the first await is caught
        let handling = future::lazy(|_| self.handler.handle(item)).flatten();
        let outcome = AssertUnwindSafe(handling)
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(HandlerError::Panicked(panic_message(&*panic))));

        match outcome {
            Ok(()) => {
                self.counters.processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(worker = self.id, error = %e, "Error processing update");
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
