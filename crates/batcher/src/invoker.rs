//! SinkInvoker - turns sink outcomes into counters and failure handling

use std::sync::Arc;
use std::time::Duration;

use contracts::{BatchSink, ContractError, FailurePolicy, Logger};

use crate::metrics::BatcherStats;

/// Wraps the caller's sink; only ever called with the batch lock held
pub(crate) struct SinkInvoker<T> {
    sink: Box<dyn BatchSink<T>>,
    policy: FailurePolicy,
    backoff: Duration,
    stats: Arc<BatcherStats>,
    logger: Arc<dyn Logger>,
}

impl<T> SinkInvoker<T> {
    pub(crate) fn new(
        sink: Box<dyn BatchSink<T>>,
        policy: FailurePolicy,
        backoff: Duration,
        stats: Arc<BatcherStats>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            sink,
            policy,
            backoff,
            stats,
            logger,
        }
    }

    pub(crate) fn sink_name(&self) -> &str {
        self.sink.name()
    }

    /// Hand `batch` to the sink
    ///
    /// On success the batch is emptied. On failure it is left untouched and,
    /// under the retry policy, the calling thread pauses for the backoff.
    pub(crate) fn flush(&mut self, batch: &mut Vec<T>) -> Result<(), ContractError> {
        let items = batch.len();

        match self.sink.flush(batch) {
            Ok(()) => {
                self.stats.add_sent(items as u64);
                batch.clear();
                self.logger
                    .trace(format_args!("Flushed {} items to '{}'", items, self.sink.name()));
                Ok(())
            }
            Err(e) => {
                self.stats.inc_flush_failed();
                self.logger.error(format_args!("Flush failed: {}", e));

                if self.policy == FailurePolicy::Retry && !self.backoff.is_zero() {
                    std::thread::sleep(self.backoff);
                }
                Err(e)
            }
        }
    }

    /// Close the sink once no further flush can happen
    pub(crate) fn close(&mut self) {
        if let Err(e) = self.sink.close() {
            self.logger
                .error(format_args!("Close failed for '{}': {}", self.sink.name(), e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{BoxError, FnSink, TracingLogger};
    use std::time::Instant;

    fn invoker<F>(policy: FailurePolicy, backoff: Duration, f: F) -> (SinkInvoker<u32>, Arc<BatcherStats>)
    where
        F: FnMut(&[u32]) -> Result<(), BoxError> + Send + 'static,
    {
        let stats = Arc::new(BatcherStats::new());
        let invoker = SinkInvoker::new(
            Box::new(FnSink::<_, BoxError>::new("test", f)),
            policy,
            backoff,
            Arc::clone(&stats),
            Arc::new(TracingLogger::new("test")),
        );
        (invoker, stats)
    }

    #[test]
    fn test_success_clears_batch_and_counts_sent() {
        let (mut invoker, stats) = invoker(FailurePolicy::Retry, Duration::ZERO, |_| Ok(()));
        let mut batch = vec![1, 2, 3];

        invoker.flush(&mut batch).unwrap();

        assert!(batch.is_empty());
        assert_eq!(stats.sent(), 3);
        assert_eq!(stats.flush_failed(), 0);
    }

    #[test]
    fn test_failure_retains_batch() {
        let (mut invoker, stats) =
            invoker(FailurePolicy::Stop, Duration::ZERO, |_| Err("down".into()));
        let mut batch = vec![1, 2];

        assert!(invoker.flush(&mut batch).is_err());

        assert_eq!(batch, vec![1, 2]);
        assert_eq!(stats.sent(), 0);
        assert_eq!(stats.flush_failed(), 1);
    }

    #[test]
    fn test_retry_policy_backs_off() {
        let backoff = Duration::from_millis(50);
        let (mut invoker, _stats) =
            invoker(FailurePolicy::Retry, backoff, |_| Err("down".into()));

        let started = Instant::now();
        assert!(invoker.flush(&mut vec![1]).is_err());
        assert!(started.elapsed() >= backoff);
    }

    #[test]
    fn test_stop_policy_does_not_back_off() {
        let (mut invoker, _stats) = invoker(FailurePolicy::Stop, Duration::from_secs(5), |_| {
            Err("down".into())
        });

        let started = Instant::now();
        assert!(invoker.flush(&mut vec![1]).is_err());
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
