//! Pipeline orchestrator - wires config, sink, batcher and producers.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use batcher::{create_sink, Batcher, BatcherHandle};
use contracts::BatcherBlueprint;
use observability::{record_batcher_stats, FlushStatsAggregator};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::producer::{spawn_producers, Event, ProducerReport, ProducerSettings};
use super::sink::MeasuredSink;
use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Batcher and sink configuration
    pub blueprint: BatcherBlueprint,

    /// Producer thread count
    pub producers: usize,

    /// Items per producer (None = until interrupted)
    pub items_per_producer: Option<u64>,

    /// Items per second per producer (None = unthrottled)
    pub rate: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Interval between stats reports
    pub report_interval: Duration,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run producers until they finish, `shutdown` resolves or the timeout hits,
    /// then close the batcher
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Sink
        let aggregator = Arc::new(Mutex::new(FlushStatsAggregator::new()));
        let sink = create_sink::<Event>(&blueprint.sink).context("Failed to create sink")?;
        let sink = MeasuredSink::new(sink, Arc::clone(&aggregator));

        // Batcher
        let batcher = Batcher::builder(blueprint.batcher.clone())
            .sink(sink)
            .build()
            .context("Failed to start batcher")?;
        let handle = batcher.handle();

        info!(
            batcher = %batcher.name(),
            sink = %blueprint.sink.name,
            producers = self.config.producers,
            "Batcher running"
        );

        // Producers
        let stop = Arc::new(AtomicBool::new(false));
        let settings = ProducerSettings {
            items: self.config.items_per_producer,
            rate: self.config.rate,
        };
        let producers = match spawn_producers(self.config.producers, settings, &handle, &stop) {
            Ok(producers) => producers,
            Err(e) => {
                stop.store(true, Ordering::Relaxed);
                close_batcher(batcher).await.ok();
                return Err(CliError::pipeline_execution(format!(
                    "failed to spawn producers: {e}"
                ))
                .into());
            }
        };
        let mut producers_done = tokio::task::spawn_blocking(move || {
            producers
                .into_iter()
                .map(|p| p.join().unwrap_or_default())
                .collect::<Vec<ProducerReport>>()
        });

        let reporter = spawn_reporter(
            batcher.name().to_string(),
            handle.clone(),
            self.config.report_interval,
        );

        let timeout = async {
            match self.config.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = &mut producers_done => {
                info!("All producers finished");
            }
            _ = shutdown => {
                warn!("Received shutdown signal, stopping producers...");
            }
            _ = timeout => {
                warn!("Pipeline timeout reached, stopping producers...");
            }
        }

        stop.store(true, Ordering::Relaxed);
        let reports = producers_done
            .await
            .map_err(|e| CliError::pipeline_execution(format!("producer join failed: {e}")))?;

        reporter.abort();

        info!("Closing batcher...");
        let close_result = close_batcher(batcher).await;

        let snapshot = handle.stats();
        record_batcher_stats(&blueprint.batcher.name, &snapshot);

        let flushes = aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .summary();

        let stats = PipelineStats {
            producers: reports.len(),
            emitted: reports.iter().map(|r| r.emitted).sum(),
            batcher: snapshot,
            flushes,
            duration: start_time.elapsed(),
        };

        close_result?;
        Ok(stats)
    }
}

/// Close on a blocking thread: close joins the batcher's workers
async fn close_batcher(batcher: Batcher<Event>) -> Result<(), CliError> {
    tokio::task::spawn_blocking(move || batcher.close())
        .await
        .map_err(|e| CliError::pipeline_execution(format!("close task failed: {e}")))?
        .map_err(CliError::from)
}

/// Periodically export and log the batcher counters
fn spawn_reporter(
    name: String,
    handle: BatcherHandle<Event>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let stats = handle.stats();
            record_batcher_stats(&name, &stats);
            info!(
                buffered = stats.buffered,
                sent = stats.sent,
                dropped = stats.dropped,
                flush_failed = stats.flush_failed,
                lost = stats.lost,
                queue_len = stats.queue_len,
                "Batcher stats"
            );
        }
    })
}
