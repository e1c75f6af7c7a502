//! BatchSink trait - batcher output interface
//!
//! Defines the abstract interface for sinks that consume whole batches.

use std::marker::PhantomData;

use crate::{BoxError, ContractError};

/// Batch output trait
///
/// The batcher calls `flush` with exactly the items accumulated so far, in
/// append order. Calls are serialized: a sink never sees two concurrent flushes.
pub trait BatchSink<T>: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one batch
    ///
    /// # Errors
    /// Returns a flush error; the batcher keeps the batch and applies its
    /// failure policy.
    fn flush(&mut self, batch: &[T]) -> Result<(), ContractError>;

    /// Release resources once the batcher has stopped
    fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

impl<T, S> BatchSink<T> for Box<S>
where
    S: BatchSink<T> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn flush(&mut self, batch: &[T]) -> Result<(), ContractError> {
        (**self).flush(batch)
    }

    fn close(&mut self) -> Result<(), ContractError> {
        (**self).close()
    }
}

/// Adapts a plain flush function into a [`BatchSink`]
///
/// `E` is the function's error type, boxed into [`ContractError::SinkFlush`].
pub struct FnSink<F, E> {
    name: String,
    f: F,
    _error: PhantomData<fn() -> E>,
}

impl<F, E> FnSink<F, E> {
    /// Wrap `f` under the given sink name
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _error: PhantomData,
        }
    }
}

impl<T, F, E> BatchSink<T> for FnSink<F, E>
where
    F: FnMut(&[T]) -> Result<(), E> + Send,
    E: Into<BoxError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn flush(&mut self, batch: &[T]) -> Result<(), ContractError> {
        (self.f)(batch).map_err(|e| ContractError::sink_flush(&self.name, batch.len(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_sink_passes_batch_through() {
        let mut seen = Vec::new();
        {
            let mut sink = FnSink::<_, BoxError>::new("collect", |batch: &[u32]| {
                seen.extend_from_slice(batch);
                Ok::<_, BoxError>(())
            });
            sink.flush(&[1, 2, 3]).unwrap();
            assert_eq!(BatchSink::<u32>::name(&sink), "collect");
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_fn_sink_wraps_error() {
        let mut sink = FnSink::<_, &str>::new("broken", |_: &[u32]| Err::<(), _>("boom"));
        let err = sink.flush(&[7, 8]).unwrap_err();
        match err {
            ContractError::SinkFlush {
                sink_name, items, ..
            } => {
                assert_eq!(sink_name, "broken");
                assert_eq!(items, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
