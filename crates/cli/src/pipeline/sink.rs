//! Sink wrapper recording per-flush metrics.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use contracts::{BatchSink, ContractError};
use observability::{record_flush, FlushStatsAggregator};

/// Times every flush of the wrapped sink
pub struct MeasuredSink<T> {
    inner: Box<dyn BatchSink<T>>,
    aggregator: Arc<Mutex<FlushStatsAggregator>>,
}

impl<T> MeasuredSink<T> {
    pub fn new(inner: Box<dyn BatchSink<T>>, aggregator: Arc<Mutex<FlushStatsAggregator>>) -> Self {
        Self { inner, aggregator }
    }
}

impl<T> BatchSink<T> for MeasuredSink<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn flush(&mut self, batch: &[T]) -> Result<(), ContractError> {
        let started = Instant::now();
        let result = self.inner.flush(batch);
        let elapsed = started.elapsed();

        record_flush(self.inner.name(), batch.len(), elapsed, result.is_ok());
        self.aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .update(batch.len(), elapsed, result.is_ok());

        result
    }

    fn close(&mut self) -> Result<(), ContractError> {
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{BoxError, FnSink};

    #[test]
    fn test_measures_success_and_failure() {
        let aggregator = Arc::new(Mutex::new(FlushStatsAggregator::new()));
        let mut calls = 0;
        let inner = FnSink::<_, BoxError>::new("inner", move |_: &[u8]| -> Result<(), BoxError> {
            calls += 1;
            if calls == 1 {
                Err("first flush fails".into())
            } else {
                Ok(())
            }
        });
        let mut sink = MeasuredSink::new(Box::new(inner), Arc::clone(&aggregator));

        assert!(sink.flush(&[1, 2, 3]).is_err());
        assert!(sink.flush(&[1, 2, 3]).is_ok());
        assert_eq!(sink.name(), "inner");

        let aggregator = aggregator.lock().unwrap();
        assert_eq!(aggregator.total_flushes, 2);
        assert_eq!(aggregator.failed_flushes, 1);
        assert_eq!(aggregator.total_items, 3);
    }
}
