//! Batcher configuration contracts shared across crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default ingress queue capacity
pub const DEFAULT_BUFFER_SIZE: usize = 10_000;
/// Default number of items per batch
pub const DEFAULT_BATCH_SIZE: usize = 100;
/// Default flush interval in milliseconds
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 1_000;
/// Default pause after a failed flush in milliseconds
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1_000;

/// What the batcher does when the sink rejects a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Keep the batch, back off, retry on the next trigger
    #[default]
    Retry,
    /// Stop the dispatcher on the first failure, size-triggered or periodic,
    /// and report it from `close`
    Stop,
}

/// Batcher configuration
///
/// Zero-valued numeric fields mean "use the default", see [`BatcherConfig::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatcherConfig {
    /// Name used in logs, metrics and worker thread names
    #[serde(default = "default_name")]
    pub name: String,

    /// Ingress queue capacity
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Items per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Periodic flush interval (milliseconds)
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Sink failure handling
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Pause after a failed flush under [`FailurePolicy::Retry`] (milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_name() -> String {
    "batcher".to_string()
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_flush_interval_ms() -> u64 {
    DEFAULT_FLUSH_INTERVAL_MS
}

fn default_retry_backoff_ms() -> u64 {
    DEFAULT_RETRY_BACKOFF_MS
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            failure_policy: FailurePolicy::default(),
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl BatcherConfig {
    /// Replace zero-valued or empty fields with their defaults
    ///
    /// `retry_backoff_ms = 0` is kept: it disables the pause.
    pub fn normalized(mut self) -> Self {
        if self.name.is_empty() {
            self.name = default_name();
        }
        if self.buffer_size == 0 {
            self.buffer_size = DEFAULT_BUFFER_SIZE;
        }
        if self.batch_size == 0 {
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        if self.flush_interval_ms == 0 {
            self.flush_interval_ms = DEFAULT_FLUSH_INTERVAL_MS;
        }
        self
    }

    /// Periodic flush interval
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// Pause after a failed flush
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
