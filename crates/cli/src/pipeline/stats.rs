//! Pipeline statistics.

use std::time::Duration;

use contracts::StatsSnapshot;
use observability::FlushSummary;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Producer threads that ran
    pub producers: usize,

    /// Enqueue attempts across all producers
    pub emitted: u64,

    /// Final batcher counters
    pub batcher: StatsSnapshot,

    /// Per-flush statistics collected at the sink
    pub flushes: FlushSummary,

    /// Total duration of the run, close included
    pub duration: Duration,
}

impl PipelineStats {
    /// Items delivered per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.batcher.sent as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Accepted items that never reached the sink
    pub fn undelivered(&self) -> u64 {
        self.batcher.buffered.saturating_sub(self.batcher.sent)
    }

    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Producers: {}", self.producers);
        println!("   ├─ Emitted: {}", self.emitted);
        println!("   └─ Throughput: {:.2} items/s", self.throughput());

        println!("\nBatcher");
        println!("   ├─ Accepted: {}", self.batcher.buffered);
        println!("   ├─ Sent: {}", self.batcher.sent);
        println!(
            "   ├─ Dropped: {} ({:.2}%)",
            self.batcher.dropped,
            self.batcher.drop_rate()
        );
        println!("   ├─ Failed flushes: {}", self.batcher.flush_failed);
        println!("   ├─ Lost after failed flush: {}", self.batcher.lost);
        println!("   └─ Undelivered: {}", self.undelivered());

        println!("\nSink");
        println!("   ├─ Flushes: {}", self.flushes.total_flushes);
        println!("   ├─ Batch size: {}", self.flushes.batch_size);
        println!("   └─ Latency (ms): {}", self.flushes.latency_ms);

        println!();
    }
}
