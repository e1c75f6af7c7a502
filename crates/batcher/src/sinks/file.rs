//! FileSink - appends every item as one JSON line

use contracts::{BatchSink, ContractError};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file
    pub path: PathBuf,
    /// Start from an empty file instead of appending
    pub truncate: bool,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .ok_or_else(|| "missing 'path' parameter".to_string())?;

        let truncate = match params.get("truncate").map(String::as_str) {
            Some("true") => true,
            Some("false") | None => false,
            Some(other) => return Err(format!("invalid truncate value '{}'", other)),
        };

        Ok(Self { path, truncate })
    }
}

/// Sink that writes batches to a JSON-lines file
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(!config.truncate)
            .truncate(config.truncate)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            config,
            writer: Some(BufWriter::new(file)),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        Self::new(name, config)
    }

    fn write_batch_to_disk<T: Serialize>(&mut self, batch: &[T]) -> std::io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| std::io::Error::other("file sink closed"))?;

        for item in batch {
            serde_json::to_writer(&mut *writer, item)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }

    fn persist_batch<T: Serialize>(&mut self, batch: &[T]) -> Result<(), ContractError> {
        self.write_batch_to_disk(batch).map_err(|e| {
            error!(sink = %self.name, path = %self.config.path.display(), error = %e, "Write failed");
            ContractError::sink_flush(&self.name, batch.len(), e)
        })
    }
}

impl<T: Serialize> BatchSink<T> for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_flush",
        skip(self, batch),
        fields(sink = %self.name, items = batch.len())
    )]
    fn flush(&mut self, batch: &[T]) -> Result<(), ContractError> {
        self.persist_batch(batch)
    }

    #[instrument(name = "file_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Serialize)]
    struct Event {
        id: u32,
    }

    #[test]
    fn test_file_sink_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("events.jsonl");
        let config = FileSinkConfig {
            path: path.clone(),
            truncate: false,
        };

        let mut sink = FileSink::new("test_file", config).unwrap();
        sink.flush(&[Event { id: 1 }, Event { id: 2 }]).unwrap();
        sink.flush(&[Event { id: 3 }]).unwrap();
        BatchSink::<Event>::close(&mut sink).unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec![r#"{"id":1}"#, r#"{"id":2}"#, r#"{"id":3}"#]);
    }

    #[test]
    fn test_file_sink_appends_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        for id in 0..2 {
            let mut sink = FileSink::new(
                "append",
                FileSinkConfig {
                    path: path.clone(),
                    truncate: false,
                },
            )
            .unwrap();
            sink.flush(&[Event { id }]).unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_flush_after_close_fails() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            path: dir.path().join("events.jsonl"),
            truncate: true,
        };

        let mut sink = FileSink::new("closed", config).unwrap();
        BatchSink::<Event>::close(&mut sink).unwrap();

        let err = sink.flush(&[Event { id: 1 }]).unwrap_err();
        assert!(matches!(err, ContractError::SinkFlush { items: 1, .. }));
    }

    #[test]
    fn test_config_from_params() {
        let params = HashMap::from([
            ("path".to_string(), "/tmp/out.jsonl".to_string()),
            ("truncate".to_string(), "true".to_string()),
        ]);
        let config = FileSinkConfig::from_params(&params).unwrap();
        assert!(config.truncate);

        assert!(FileSinkConfig::from_params(&HashMap::new()).is_err());
    }
}
