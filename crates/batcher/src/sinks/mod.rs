//! Sink implementations
//!
//! Contains LogSink and FileSink, plus the factory building one from a
//! [`SinkConfig`].

mod file;
mod log;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;

use std::fmt::Debug;

use contracts::{BatchSink, SinkConfig, SinkType};
use serde::Serialize;
use tracing::instrument;

use crate::error::BatcherError;

/// Create a boxed sink from configuration
#[instrument(
    name = "batcher_create_sink",
    skip(config),
    fields(sink = %config.name, sink_type = %config.sink_type)
)]
pub fn create_sink<T>(config: &SinkConfig) -> Result<Box<dyn BatchSink<T>>, BatcherError>
where
    T: Serialize + Debug + 'static,
{
    match config.sink_type {
        SinkType::Log => Ok(Box::new(LogSink::new(&config.name))),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| BatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(Box::new(sink))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_create_log_sink() {
        let sink = create_sink::<u32>(&SinkConfig::log("audit")).unwrap();
        assert_eq!(sink.name(), "audit");
    }

    #[test]
    fn test_create_file_sink_requires_path() {
        let config = SinkConfig {
            name: "out".to_string(),
            sink_type: SinkType::File,
            params: HashMap::new(),
        };

        match create_sink::<u32>(&config) {
            Err(BatcherError::SinkCreation { name, message }) => {
                assert_eq!(name, "out");
                assert!(message.contains("path"));
            }
            _ => panic!("expected sink creation error"),
        }
    }
}
