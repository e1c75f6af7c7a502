//! Bounded ingress queue and the producer-side handle

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::trace;

use contracts::StatsSnapshot;

use crate::metrics::BatcherStats;

/// Create the ingress channel and its producer handle
pub(crate) fn channel<T>(
    capacity: usize,
    stats: Arc<BatcherStats>,
) -> (BatcherHandle<T>, mpsc::Receiver<T>) {
    let (tx, rx) = mpsc::channel(capacity);
    (BatcherHandle { tx, stats }, rx)
}

/// Cloneable producer handle
///
/// Enqueue never blocks: an item is either accepted or dropped.
pub struct BatcherHandle<T> {
    /// Ingress sender
    tx: mpsc::Sender<T>,
    /// Shared counters
    stats: Arc<BatcherStats>,
}

impl<T> Clone for BatcherHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<T> BatcherHandle<T> {
    /// Queue an item (non-blocking)
    ///
    /// Returns true if accepted, false if the queue is full or the batcher has
    /// stopped (item dropped)
    pub fn enqueue(&self, item: T) -> bool {
        match self.tx.try_send(item) {
            Ok(()) => {
                self.stats.inc_buffered();
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.stats.inc_dropped();
                trace!("Ingress queue full, item dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.stats.inc_dropped();
                trace!("Batcher stopped, item dropped");
                false
            }
        }
    }

    /// Put back an item the dispatcher could not place in a batch
    ///
    /// Not counted as a new acceptance. With no room the item is counted as
    /// lost; `dropped` only tracks rejected enqueue calls.
    pub(crate) fn requeue(&self, item: T) -> bool {
        match self.tx.try_send(item) {
            Ok(()) => true,
            Err(_) => {
                self.stats.inc_lost();
                false
            }
        }
    }

    /// Items currently waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Whether the batcher stopped accepting items
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Point-in-time snapshot of the counters
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.queue_len())
    }
}
