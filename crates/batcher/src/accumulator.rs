//! Batch accumulator - the in-progress batch behind one exclusive lock

use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::ContractError;

use crate::invoker::SinkInvoker;

/// Why an append did not complete cleanly
pub(crate) enum AppendError<T> {
    /// A retained full batch could not be flushed; the item was not appended
    Rejected { item: T, error: ContractError },
    /// The item was appended but the size-triggered flush failed; the batch is retained
    Flush(ContractError),
}

/// Batch buffer and the sink it drains into
///
/// The sink lives under the same lock so a flush holds it for the whole call.
struct Batch<T> {
    items: Vec<T>,
    invoker: SinkInvoker<T>,
}

/// Shared by the dispatcher (size trigger) and the timer (time trigger)
pub(crate) struct Accumulator<T> {
    batch: Mutex<Batch<T>>,
    batch_size: usize,
}

impl<T> Accumulator<T> {
    pub(crate) fn new(batch_size: usize, invoker: SinkInvoker<T>) -> Self {
        Self {
            batch: Mutex::new(Batch {
                items: Vec::with_capacity(batch_size),
                invoker,
            }),
            batch_size,
        }
    }

    // A panicking sink must not wedge the other trigger.
    fn lock(&self) -> MutexGuard<'_, Batch<T>> {
        self.batch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an item, flushing synchronously once the batch is full
    pub(crate) fn append(&self, item: T) -> Result<(), AppendError<T>> {
        let mut guard = self.lock();
        let batch = &mut *guard;

        // Left full by an earlier failed flush
        if batch.items.len() >= self.batch_size {
            if let Err(error) = batch.invoker.flush(&mut batch.items) {
                return Err(AppendError::Rejected { item, error });
            }
        }

        batch.items.push(item);

        if batch.items.len() >= self.batch_size {
            batch
                .invoker
                .flush(&mut batch.items)
                .map_err(AppendError::Flush)?;
        }
        Ok(())
    }

    /// Flush whatever is accumulated; no-op on an empty batch
    ///
    /// Returns the number of items delivered.
    pub(crate) fn try_flush(&self) -> Result<usize, ContractError> {
        let mut guard = self.lock();
        let batch = &mut *guard;

        if batch.items.is_empty() {
            return Ok(0);
        }

        let items = batch.items.len();
        batch.invoker.flush(&mut batch.items)?;
        Ok(items)
    }

    /// Items currently held
    pub(crate) fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub(crate) fn sink_name(&self) -> String {
        self.lock().invoker.sink_name().to_string()
    }

    pub(crate) fn close_sink(&self) {
        self.lock().invoker.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::BatcherStats;
    use contracts::{BoxError, FailurePolicy, FnSink, TracingLogger};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    type Flushed = Arc<Mutex<Vec<Vec<u32>>>>;

    fn accumulator(batch_size: usize, failures: usize) -> (Accumulator<u32>, Flushed, Arc<BatcherStats>) {
        let flushed: Flushed = Arc::new(Mutex::new(Vec::new()));
        let stats = Arc::new(BatcherStats::new());
        let remaining = AtomicUsize::new(failures);
        let sink_flushed = Arc::clone(&flushed);

        let sink = FnSink::<_, BoxError>::new("test", move |batch: &[u32]| -> Result<(), BoxError> {
            if remaining.load(Ordering::SeqCst) > 0 {
                remaining.fetch_sub(1, Ordering::SeqCst);
                return Err("unavailable".into());
            }
            sink_flushed.lock().unwrap().push(batch.to_vec());
            Ok(())
        });
        let invoker = SinkInvoker::new(
            Box::new(sink),
            FailurePolicy::Retry,
            Duration::ZERO,
            Arc::clone(&stats),
            Arc::new(TracingLogger::new("test")),
        );
        (Accumulator::new(batch_size, invoker), flushed, stats)
    }

    #[test]
    fn test_flush_when_batch_fills() {
        let (acc, flushed, stats) = accumulator(3, 0);

        for i in 0..3 {
            assert!(acc.append(i).is_ok());
        }
        assert_eq!(*flushed.lock().unwrap(), vec![vec![0, 1, 2]]);
        assert_eq!(acc.len(), 0);

        assert!(acc.append(3).is_ok());
        assert_eq!(acc.len(), 1);
        assert_eq!(stats.sent(), 3);
    }

    #[test]
    fn test_try_flush_empty_is_noop() {
        let (acc, flushed, stats) = accumulator(3, 0);

        assert_eq!(acc.try_flush().unwrap(), 0);
        assert!(flushed.lock().unwrap().is_empty());
        assert_eq!(stats.flush_failed(), 0);
    }

    #[test]
    fn test_try_flush_partial_batch() {
        let (acc, flushed, _stats) = accumulator(10, 0);
        acc.append(7).ok();
        acc.append(8).ok();

        assert_eq!(acc.try_flush().unwrap(), 2);
        assert_eq!(*flushed.lock().unwrap(), vec![vec![7, 8]]);
    }

    #[test]
    fn test_failed_size_flush_retains_batch() {
        let (acc, flushed, stats) = accumulator(2, 1);

        assert!(acc.append(1).is_ok());
        match acc.append(2) {
            Err(AppendError::Flush(_)) => {}
            _ => panic!("expected size-triggered flush failure"),
        }
        assert_eq!(acc.len(), 2);
        assert_eq!(stats.flush_failed(), 1);

        // Next append retries the retained batch first
        assert!(acc.append(3).is_ok());
        assert_eq!(*flushed.lock().unwrap(), vec![vec![1, 2]]);
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn test_full_retained_batch_rejects_item() {
        let (acc, _flushed, stats) = accumulator(1, 2);

        assert!(matches!(acc.append(1), Err(AppendError::Flush(_))));
        match acc.append(2) {
            Err(AppendError::Rejected { item, .. }) => assert_eq!(item, 2),
            _ => panic!("expected rejection"),
        }
        assert_eq!(acc.len(), 1);
        assert_eq!(stats.flush_failed(), 2);
    }
}
