//! LogSink - logs batch summaries via tracing

use std::fmt::Debug;

use contracts::{BatchSink, ContractError};
use tracing::{info, instrument};

/// Sink that logs batch summaries for debugging
pub struct LogSink {
    name: String,
    batches: u64,
    items: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batches: 0,
            items: 0,
        }
    }

    /// Batches seen so far
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Items seen so far
    pub fn items(&self) -> u64 {
        self.items
    }

    fn log_batch_summary<T: Debug>(&self, batch: &[T]) {
        info!(
            sink = %self.name,
            batch = self.batches,
            items = batch.len(),
            first = ?batch.first(),
            last = ?batch.last(),
            "Batch received"
        );
    }
}

impl<T: Debug> BatchSink<T> for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_flush",
        skip(self, batch),
        fields(sink = %self.name, items = batch.len())
    )]
    fn flush(&mut self, batch: &[T]) -> Result<(), ContractError> {
        self.batches += 1;
        self.items += batch.len() as u64;
        self.log_batch_summary(batch);
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            batches = self.batches,
            items = self.items,
            "LogSink closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sink_flush() {
        let mut sink = LogSink::new("test_log");

        assert!(sink.flush(&[1u32, 2, 3]).is_ok());
        assert!(sink.flush(&[4u32]).is_ok());

        assert_eq!(sink.batches(), 2);
        assert_eq!(sink.items(), 4);
    }

    #[test]
    fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(BatchSink::<u32>::name(&sink), "my_logger");
    }
}
