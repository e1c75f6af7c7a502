//! Batcher metrics
//!
//! Exports engine counters through the `metrics` facade and keeps running
//! flush statistics in memory for end-of-run summaries.

use std::time::Duration;

use contracts::StatsSnapshot;
use metrics::{counter, gauge, histogram};

/// Export a counter snapshot as gauges
///
/// The engine owns the counters, so absolute values are published rather
/// than increments.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_batcher_stats;
///
/// record_batcher_stats(batcher.name(), &batcher.stats());
/// ```
pub fn record_batcher_stats(batcher: &str, stats: &StatsSnapshot) {
    let name = batcher.to_string();

    gauge!("batcher_items_buffered", "batcher" => name.clone()).set(stats.buffered as f64);
    gauge!("batcher_items_sent", "batcher" => name.clone()).set(stats.sent as f64);
    gauge!("batcher_items_dropped", "batcher" => name.clone()).set(stats.dropped as f64);
    gauge!("batcher_flush_failed", "batcher" => name.clone()).set(stats.flush_failed as f64);
    gauge!("batcher_items_lost", "batcher" => name.clone()).set(stats.lost as f64);
    gauge!("batcher_queue_depth", "batcher" => name.clone()).set(stats.queue_len as f64);
    gauge!("batcher_drop_rate_percent", "batcher" => name).set(stats.drop_rate());
}

/// Record one sink invocation
pub fn record_flush(sink_name: &str, items: usize, elapsed: Duration, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "batcher_flushes_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        counter!("batcher_flushed_items_total", "sink" => sink_name.to_string())
            .increment(items as u64);
    }

    histogram!("batcher_flush_size", "sink" => sink_name.to_string()).record(items as f64);
    histogram!("batcher_flush_latency_ms", "sink" => sink_name.to_string())
        .record(elapsed.as_secs_f64() * 1000.0);
}

/// Flush statistics aggregator
///
/// Aggregates per-flush observations in memory for summaries.
#[derive(Debug, Clone, Default)]
pub struct FlushStatsAggregator {
    /// Sink invocations
    pub total_flushes: u64,

    /// Failed sink invocations
    pub failed_flushes: u64,

    /// Items delivered by successful flushes
    pub total_items: u64,

    /// Batch size of successful flushes
    pub batch_size_stats: RunningStats,

    /// Sink latency in milliseconds, all invocations
    pub latency_stats: RunningStats,
}

impl FlushStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one flush into the statistics
    pub fn update(&mut self, items: usize, elapsed: Duration, success: bool) {
        self.total_flushes += 1;
        self.latency_stats.push(elapsed.as_secs_f64() * 1000.0);

        if success {
            self.total_items += items as u64;
            self.batch_size_stats.push(items as f64);
        } else {
            self.failed_flushes += 1;
        }
    }

    pub fn summary(&self) -> FlushSummary {
        FlushSummary {
            total_flushes: self.total_flushes,
            failed_flushes: self.failed_flushes,
            total_items: self.total_items,
            failure_rate: if self.total_flushes > 0 {
                self.failed_flushes as f64 / self.total_flushes as f64 * 100.0
            } else {
                0.0
            },
            batch_size: StatsSummary::from(&self.batch_size_stats),
            latency_ms: StatsSummary::from(&self.latency_stats),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Flush summary
#[derive(Debug, Clone, Default)]
pub struct FlushSummary {
    pub total_flushes: u64,
    pub failed_flushes: u64,
    pub total_items: u64,
    pub failure_rate: f64,
    pub batch_size: StatsSummary,
    pub latency_ms: StatsSummary,
}

impl std::fmt::Display for FlushSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Flush Summary ===")?;
        writeln!(f, "Flushes: {}", self.total_flushes)?;
        writeln!(
            f,
            "Failed flushes: {} ({:.2}%)",
            self.failed_flushes, self.failure_rate
        )?;
        writeln!(f, "Items delivered: {}", self.total_items)?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
