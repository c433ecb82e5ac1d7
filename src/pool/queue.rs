//! Ingestion Queue
//!
//! Multi-producer, multi-consumer FIFO built on tokio's mpsc channels. The
//! receiving half sits behind one async mutex so that every worker pulls
//! from the same head, which keeps dequeue order globally FIFO.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::error::PoolError;

/// What a worker can pull off the queue.
#[derive(Debug)]
pub(crate) enum Message<T> {
    Item(T),
    /// One per worker, queued behind pending items at shutdown
    Stop,
}

enum Sender<T> {
    Unbounded(mpsc::UnboundedSender<Message<T>>),
    Bounded(mpsc::Sender<Message<T>>),
}

enum Receiver<T> {
    Unbounded(mpsc::UnboundedReceiver<Message<T>>),
    Bounded(mpsc::Receiver<Message<T>>),
}

// == Work Queue ==
pub(crate) struct WorkQueue<T> {
    sender: Sender<T>,
    receiver: Arc<Mutex<Receiver<T>>>,
    /// Items enqueued but not yet taken by a worker
    pending: Arc<AtomicUsize>,
    capacity: Option<NonZeroUsize>,
}

impl<T> WorkQueue<T> {
    /// Creates a queue; `None` capacity means unbounded.
    pub(crate) fn new(capacity: Option<NonZeroUsize>) -> Self {
        let (sender, receiver) = match capacity {
            Some(capacity) => {
                let (tx, rx) = mpsc::channel(capacity.get());
                (Sender::Bounded(tx), Receiver::Bounded(rx))
            }
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                (Sender::Unbounded(tx), Receiver::Unbounded(rx))
            }
        };

        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            pending: Arc::new(AtomicUsize::new(0)),
            capacity,
        }
    }

    // == Push ==
    /// Appends an item without waiting.
    ///
    /// A full bounded queue rejects the item rather than blocking.
    pub(crate) fn push(&self, item: T) -> Result<(), PoolError> {
        self.pending.fetch_add(1, Ordering::SeqCst);

        let result = match &self.sender {
            Sender::Unbounded(tx) => tx.send(Message::Item(item)).map_err(|_| PoolError::Closed),
            Sender::Bounded(tx) => tx.try_send(Message::Item(item)).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    PoolError::QueueFull(self.capacity.map_or(0, NonZeroUsize::get))
                }
                mpsc::error::TrySendError::Closed(_) => PoolError::Closed,
            }),
        };

        if result.is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
        result
    }

    /// Queues a stop marker, waiting for room on a bounded queue.
    pub(crate) async fn push_stop(&self) -> Result<(), PoolError> {
        match &self.sender {
            Sender::Unbounded(tx) => tx.send(Message::Stop).map_err(|_| PoolError::Closed),
            Sender::Bounded(tx) => tx.send(Message::Stop).await.map_err(|_| PoolError::Closed),
        }
    }

    /// Handle used by workers to pull messages.
    pub(crate) fn consumer(&self) -> Consumer<T> {
        Consumer {
            receiver: Arc::clone(&self.receiver),
            pending: Arc::clone(&self.pending),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub(crate) fn capacity(&self) -> Option<NonZeroUsize> {
        self.capacity
    }
}

// == Consumer ==
/// Receiving side shared by all workers.
pub(crate) struct Consumer<T> {
    receiver: Arc<Mutex<Receiver<T>>>,
    pending: Arc<AtomicUsize>,
}

impl<T> Consumer<T> {
    /// Waits for the next message. `None` once every sender is gone.
    pub(crate) async fn recv(&self) -> Option<Message<T>> {
        let mut receiver = self.receiver.lock().await;
        let message = match &mut *receiver {
            Receiver::Unbounded(rx) => rx.recv().await,
            Receiver::Bounded(rx) => rx.recv().await,
        };

        if let Some(Message::Item(_)) = message {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
        message
    }
}
