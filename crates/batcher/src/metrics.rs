//! Batcher counters for observability

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::StatsSnapshot;

/// Lock-free counters shared by producers and both workers
#[derive(Debug, Default)]
pub struct BatcherStats {
    /// Items accepted into the ingress queue
    buffered: AtomicU64,
    /// Items handed to the sink successfully
    sent: AtomicU64,
    /// Items rejected at enqueue
    dropped: AtomicU64,
    /// Failed sink invocations
    flush_failed: AtomicU64,
    /// Accepted items discarded after a failed flush
    lost: AtomicU64,
}

impl BatcherStats {
    /// Create new counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Get accepted count
    pub fn buffered(&self) -> u64 {
        self.buffered.load(Ordering::Relaxed)
    }

    /// Increment accepted count
    pub fn inc_buffered(&self) {
        self.buffered.fetch_add(1, Ordering::Relaxed);
    }

    /// Get sent count
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Add a flushed batch to the sent count
    pub fn add_sent(&self, items: u64) {
        self.sent.fetch_add(items, Ordering::Relaxed);
    }

    /// Get dropped count
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Increment dropped count
    pub fn inc_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get failed flush count
    pub fn flush_failed(&self) -> u64 {
        self.flush_failed.load(Ordering::Relaxed)
    }

    /// Increment failed flush count
    pub fn inc_flush_failed(&self) {
        self.flush_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get lost count
    pub fn lost(&self) -> u64 {
        self.lost.load(Ordering::Relaxed)
    }

    /// Increment lost count
    pub fn inc_lost(&self) {
        self.lost.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self, queue_len: usize) -> StatsSnapshot {
        StatsSnapshot {
            buffered: self.buffered(),
            sent: self.sent(),
            dropped: self.dropped(),
            flush_failed: self.flush_failed(),
            lost: self.lost(),
            queue_len,
        }
    }
}
