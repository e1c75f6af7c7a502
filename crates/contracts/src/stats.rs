//! StatsSnapshot - point-in-time view of the batcher counters

use serde::Serialize;

/// Snapshot of batcher counters (for reporting)
///
/// Each field is read independently; the counters are not captured
/// atomically as a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Items accepted into the ingress queue
    pub buffered: u64,
    /// Items handed to the sink successfully
    pub sent: u64,
    /// Items rejected because the queue was full or the batcher had stopped
    pub dropped: u64,
    /// Sink invocations that returned an error
    pub flush_failed: u64,
    /// Accepted items discarded after a failed flush found no room to requeue them
    pub lost: u64,
    /// Items currently waiting in the ingress queue
    pub queue_len: usize,
}

impl StatsSnapshot {
    /// Enqueue attempts seen so far
    pub fn attempts(&self) -> u64 {
        self.buffered + self.dropped
    }

    /// Dropped items as a percentage of attempts
    pub fn drop_rate(&self) -> f64 {
        let attempts = self.attempts();
        if attempts > 0 {
            self.dropped as f64 / attempts as f64 * 100.0
        } else {
            0.0
        }
    }
}
