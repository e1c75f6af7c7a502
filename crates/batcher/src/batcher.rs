//! Batcher - public engine: construction, enqueue, stats, shutdown

use std::future::Future;
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::{oneshot, watch};
use tracing::{debug, info, instrument};

use contracts::{
    BatchSink, BatcherConfig, BoxError, FnSink, Logger, StatsSnapshot, TracingLogger,
};

use crate::accumulator::Accumulator;
use crate::dispatcher::Dispatcher;
use crate::error::BatcherError;
use crate::invoker::SinkInvoker;
use crate::metrics::BatcherStats;
use crate::queue::{self, BatcherHandle};
use crate::timer::FlushTimer;

/// Builder for creating a Batcher
pub struct BatcherBuilder<T> {
    config: BatcherConfig,
    sink: Option<Box<dyn BatchSink<T>>>,
    logger: Option<Arc<dyn Logger>>,
}

impl<T: Send + 'static> BatcherBuilder<T> {
    /// Create a new BatcherBuilder
    pub fn new(config: BatcherConfig) -> Self {
        Self {
            config,
            sink: None,
            logger: None,
        }
    }

    /// Set the sink batches are flushed to
    pub fn sink<S>(self, sink: S) -> Self
    where
        S: BatchSink<T> + 'static,
    {
        self.boxed_sink(Box::new(sink))
    }

    /// Set an already boxed sink (e.g. from [`crate::create_sink`])
    pub fn boxed_sink(mut self, sink: Box<dyn BatchSink<T>>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Use a plain flush function as the sink
    pub fn sink_fn<F, E>(self, f: F) -> Self
    where
        F: FnMut(&[T]) -> Result<(), E> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        let name = self.config.name.clone();
        self.sink(FnSink::<F, E>::new(name, f))
    }

    /// Replace the default tracing-backed logger
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Build and start the batcher
    ///
    /// Spawns the dispatcher and flush timer threads.
    #[instrument(name = "batcher_builder_build", skip(self), fields(batcher = %self.config.name))]
    pub fn build(self) -> Result<Batcher<T>, BatcherError> {
        let config = self.config.normalized();
        let sink = self.sink.ok_or_else(|| BatcherError::MissingSink {
            name: config.name.clone(),
        })?;
        let logger = self
            .logger
            .unwrap_or_else(|| Arc::new(TracingLogger::new(config.name.clone())));

        let stats = Arc::new(BatcherStats::new());
        let (handle, rx) = queue::channel(config.buffer_size, Arc::clone(&stats));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let invoker = SinkInvoker::new(
            sink,
            config.failure_policy,
            config.retry_backoff(),
            Arc::clone(&stats),
            Arc::clone(&logger),
        );
        let accumulator = Arc::new(Accumulator::new(config.batch_size, invoker));
        let (failure_tx, failure_rx) = oneshot::channel();

        let dispatcher = Dispatcher::new(
            config.name.clone(),
            rx,
            handle.clone(),
            Arc::clone(&accumulator),
            config.failure_policy,
            failure_rx,
            shutdown_rx.clone(),
            Arc::clone(&logger),
        );
        let dispatcher_handle = spawn_worker(&config.name, "dispatcher", dispatcher.run())?;

        let timer = FlushTimer::new(
            config.name.clone(),
            Arc::clone(&accumulator),
            config.flush_interval(),
            config.failure_policy,
            failure_tx,
            shutdown_rx,
        );
        let timer_handle = match spawn_worker(&config.name, "timer", timer.run()) {
            Ok(h) => h,
            Err(e) => {
                shutdown_tx.send_replace(true);
                // Nothing was enqueued yet, the drain is empty
                let _ = dispatcher_handle.join();
                return Err(e);
            }
        };

        info!(
            buffer_size = config.buffer_size,
            batch_size = config.batch_size,
            flush_interval_ms = config.flush_interval_ms,
            failure_policy = ?config.failure_policy,
            sink = %accumulator.sink_name(),
            "Batcher started"
        );

        Ok(Batcher {
            name: config.name,
            handle,
            accumulator,
            shutdown: shutdown_tx,
            dispatcher: Some(dispatcher_handle),
            timer: Some(timer_handle),
            logger,
        })
    }
}

/// Run `future` on a dedicated named thread with its own single-threaded runtime
fn spawn_worker<F>(
    batcher: &str,
    worker: &'static str,
    future: F,
) -> Result<JoinHandle<F::Output>, BatcherError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|source| BatcherError::Spawn { worker, source })?;

    std::thread::Builder::new()
        .name(format!("{batcher}-{worker}"))
        .spawn(move || runtime.block_on(future))
        .map_err(|source| BatcherError::Spawn { worker, source })
}

/// Batching engine
///
/// Accepts items from any number of producers, groups them into batches of
/// `batch_size` and hands each batch to the sink when it fills or when
/// `flush_interval` elapses, whichever comes first.
pub struct Batcher<T: Send + 'static> {
    name: String,
    handle: BatcherHandle<T>,
    accumulator: Arc<Accumulator<T>>,
    shutdown: watch::Sender<bool>,
    dispatcher: Option<JoinHandle<Result<(), BatcherError>>>,
    timer: Option<JoinHandle<()>>,
    logger: Arc<dyn Logger>,
}

impl<T: Send + 'static> Batcher<T> {
    /// Start building a batcher
    pub fn builder(config: BatcherConfig) -> BatcherBuilder<T> {
        BatcherBuilder::new(config)
    }

    /// Create and start a batcher flushing into `sink`
    pub fn new<S>(config: BatcherConfig, sink: S) -> Result<Self, BatcherError>
    where
        S: BatchSink<T> + 'static,
    {
        BatcherBuilder::new(config).sink(sink).build()
    }

    /// Batcher name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue an item (non-blocking)
    ///
    /// Returns true if accepted, false if dropped
    pub fn enqueue(&self, item: T) -> bool {
        self.handle.enqueue(item)
    }

    /// Cloneable producer handle for other threads
    pub fn handle(&self) -> BatcherHandle<T> {
        self.handle.clone()
    }

    /// Point-in-time snapshot of the counters
    pub fn stats(&self) -> StatsSnapshot {
        self.handle.stats()
    }

    /// Drain, flush and stop both workers
    ///
    /// Blocks until the dispatcher has drained the queue and issued its final
    /// flush. Returns the drain error, or under the stop policy the flush error
    /// that stopped the dispatcher.
    #[instrument(name = "batcher_close", skip(self), fields(batcher = %self.name))]
    pub fn close(mut self) -> Result<(), BatcherError> {
        self.shutdown.send_replace(true);

        let dispatched = match self.dispatcher.take() {
            Some(handle) => handle
                .join()
                .unwrap_or(Err(BatcherError::WorkerPanicked {
                    worker: "dispatcher",
                })),
            None => Ok(()),
        };

        let timer = match self.timer.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| BatcherError::WorkerPanicked { worker: "timer" }),
            None => Ok(()),
        };

        self.accumulator.close_sink();

        let stats = self.stats();
        info!(
            buffered = stats.buffered,
            sent = stats.sent,
            dropped = stats.dropped,
            flush_failed = stats.flush_failed,
            "Batcher closed"
        );

        dispatched.and(timer)
    }
}

impl<T: Send + 'static> Drop for Batcher<T> {
    fn drop(&mut self) {
        if self.dispatcher.is_some() {
            self.shutdown.send_replace(true);
            self.logger.warn(format_args!(
                "Batcher '{}' dropped without close, draining in background",
                self.name
            ));
        } else {
            debug!(batcher = %self.name, "Batcher dropped");
        }
    }
}

impl<T: Send + 'static> std::fmt::Debug for Batcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batcher")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish()
    }
}
