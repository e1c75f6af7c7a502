//! Periodic flush timer - bounds how long a partial batch can wait

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, instrument};

use contracts::{ContractError, FailurePolicy};

use crate::accumulator::Accumulator;

pub(crate) struct FlushTimer<T> {
    name: String,
    accumulator: Arc<Accumulator<T>>,
    period: Duration,
    policy: FailurePolicy,
    /// Hands a fatal flush error to the dispatcher under the stop policy
    failure: Option<oneshot::Sender<ContractError>>,
    shutdown: watch::Receiver<bool>,
}

impl<T: Send + 'static> FlushTimer<T> {
    pub(crate) fn new(
        name: String,
        accumulator: Arc<Accumulator<T>>,
        period: Duration,
        policy: FailurePolicy,
        failure: oneshot::Sender<ContractError>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            name,
            accumulator,
            period,
            policy,
            failure: Some(failure),
            shutdown,
        }
    }

    #[instrument(name = "batcher_flush_timer", skip(self), fields(batcher = %self.name))]
    pub(crate) async fn run(mut self) {
        // First tick one full period after start
        let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
        // A slow sink delays the next tick instead of causing a burst
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.changed() => break,

                _ = ticker.tick() => match self.accumulator.try_flush() {
                    Ok(items) => {
                        if items > 0 {
                            debug!(items, "Periodic flush");
                        }
                    }
                    // Counted and logged by the invoker
                    Err(error) => {
                        if self.policy == FailurePolicy::Stop {
                            if let Some(failure) = self.failure.take() {
                                // Receiver gone means the dispatcher already stopped
                                let _ = failure.send(error);
                            }
                            break;
                        }
                    }
                },
            }
        }

        debug!("Flush timer stopped");
    }
}
