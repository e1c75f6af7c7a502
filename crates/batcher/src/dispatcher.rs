//! Dispatcher - single consumer of the ingress queue
//!
//! Running: append each received item. Draining (on shutdown): close the
//! queue, append everything left, final flush, retrying failed flushes a
//! bounded number of times. Stopped: return.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, instrument};

use contracts::{ContractError, FailurePolicy, Logger};

use crate::accumulator::{Accumulator, AppendError};
use crate::error::BatcherError;
use crate::queue::BatcherHandle;

/// Consecutive failed flushes tolerated while draining under the retry policy
pub(crate) const DRAIN_ATTEMPTS: u32 = 10;

pub(crate) struct Dispatcher<T> {
    name: String,
    rx: mpsc::Receiver<T>,
    /// Used to put back items a failed flush could not take
    ingress: BatcherHandle<T>,
    accumulator: Arc<Accumulator<T>>,
    policy: FailurePolicy,
    /// Fatal periodic flush failure reported by the timer
    timer_failure: oneshot::Receiver<ContractError>,
    shutdown: watch::Receiver<bool>,
    logger: Arc<dyn Logger>,
}

impl<T: Send + 'static> Dispatcher<T> {
    pub(crate) fn new(
        name: String,
        rx: mpsc::Receiver<T>,
        ingress: BatcherHandle<T>,
        accumulator: Arc<Accumulator<T>>,
        policy: FailurePolicy,
        timer_failure: oneshot::Receiver<ContractError>,
        shutdown: watch::Receiver<bool>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            name,
            rx,
            ingress,
            accumulator,
            policy,
            timer_failure,
            shutdown,
            logger,
        }
    }

    /// Run until shutdown, then drain
    ///
    /// Returns the drain error, or under the stop policy the flush error that
    /// ended the loop, whether size-triggered here or periodic in the timer.
    #[instrument(name = "batcher_dispatcher_loop", skip(self), fields(batcher = %self.name))]
    pub(crate) async fn run(mut self) -> Result<(), BatcherError> {
        debug!("Dispatcher started");
        let mut item_count: u64 = 0;
        // Set once the timer dropped its sender without reporting
        let mut timer_gone = false;

        loop {
            tokio::select! {
                biased;

                // Err means the batcher itself is gone: drain as well
                _ = self.shutdown.changed() => break,

                failure = &mut self.timer_failure, if !timer_gone => match failure {
                    Ok(e) => return Err(self.stop(e)),
                    Err(_) => timer_gone = true,
                },

                item = self.rx.recv() => {
                    let Some(item) = item else { break };
                    item_count += 1;

                    if let Err(e) = self.dispatch(item) {
                        return Err(self.stop(e));
                    }

                    if item_count.is_multiple_of(10_000) {
                        debug!(items = item_count, "Dispatcher progress");
                    }
                }
            }
        }

        info!(items = item_count, "Dispatcher received shutdown, draining");
        self.drain()
    }

    fn stop(&self, error: ContractError) -> BatcherError {
        self.logger.error(format_args!(
            "Dispatcher stopped after flush failure, {} items left in queue",
            self.rx.len()
        ));
        BatcherError::Stopped(error)
    }

    /// Append one item; an error means the loop must terminate
    fn dispatch(&self, item: T) -> Result<(), ContractError> {
        let error = match self.accumulator.append(item) {
            Ok(()) => return Ok(()),
            Err(AppendError::Rejected { item, error }) => {
                self.logger
                    .error(format_args!("Unable to flush batch: {}", error));
                if !self.ingress.requeue(item) {
                    self.logger
                        .warn(format_args!("Ingress queue full, item lost after failed flush"));
                }
                error
            }
            Err(AppendError::Flush(error)) => error,
        };

        match self.policy {
            FailurePolicy::Retry => Ok(()),
            FailurePolicy::Stop => Err(error),
        }
    }

    /// Deliver everything still queued, then the final partial batch
    ///
    /// Under the retry policy a failed flush is retried (the invoker backs
    /// off) until `DRAIN_ATTEMPTS` consecutive failures; under the stop policy
    /// the first failure ends the drain.
    fn drain(mut self) -> Result<(), BatcherError> {
        // No new items from here on; enqueue reports them as dropped
        self.rx.close();

        self.logger
            .info(format_args!("Draining buffer ({} items)", self.rx.len()));

        let mut failures = 0;
        while let Ok(item) = self.rx.try_recv() {
            let mut pending = item;
            loop {
                match self.accumulator.append(pending) {
                    Ok(()) => {
                        failures = 0;
                        break;
                    }
                    // Item is in the retained batch; the next append retries it
                    Err(AppendError::Flush(error)) => {
                        self.drain_failure(&mut failures, error, 0)?;
                        break;
                    }
                    Err(AppendError::Rejected { item, error }) => {
                        self.drain_failure(&mut failures, error, 1)?;
                        pending = item;
                    }
                }
            }
        }

        self.logger.info(format_args!("Buffer drained, flushing"));
        loop {
            match self.accumulator.try_flush() {
                Ok(_) => break,
                Err(error) => self.drain_failure(&mut failures, error, 0)?,
            }
        }
        self.logger.info(format_args!("Buffer flushed"));

        Ok(())
    }

    /// Count a failed flush during drain; `Err` once the drain must give up
    ///
    /// `held` is the number of items in hand that are neither queued nor batched.
    fn drain_failure(
        &self,
        failures: &mut u32,
        error: ContractError,
        held: usize,
    ) -> Result<(), BatcherError> {
        *failures += 1;
        if self.policy == FailurePolicy::Retry && *failures < DRAIN_ATTEMPTS {
            debug!(attempt = *failures, "Retrying flush during drain");
            return Ok(());
        }

        let abandoned = self.rx.len() + self.accumulator.len() + held;
        self.logger.error(format_args!(
            "Drain aborted after {} failed flushes, {} items not delivered",
            failures, abandoned
        ));
        Err(BatcherError::Drain(error))
    }
}
