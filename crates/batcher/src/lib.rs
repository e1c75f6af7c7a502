//! # Batcher
//!
//! Generic batching/flushing engine.
//!
//! Responsibilities:
//! - Accept items from any number of producers without blocking them
//! - Group items into fixed-size batches
//! - Hand each batch to a sink when it fills or when the flush interval elapses
//! - Drain and flush everything accepted on close
//!
//! # Example
//!
//! ```no_run
//! use batcher::{Batcher, BatcherConfig};
//!
//! let batcher = Batcher::builder(BatcherConfig::default())
//!     .sink_fn(|batch: &[String]| {
//!         println!("writing {} lines", batch.len());
//!         Ok::<_, std::io::Error>(())
//!     })
//!     .build()
//!     .unwrap();
//!
//! batcher.enqueue("hello".to_string());
//! batcher.close().unwrap();
//! ```

mod accumulator;
pub mod batcher;
mod dispatcher;
pub mod error;
mod invoker;
pub mod metrics;
mod queue;
pub mod sinks;
mod timer;

pub use crate::batcher::{Batcher, BatcherBuilder};
pub use crate::error::BatcherError;
pub use crate::metrics::BatcherStats;
pub use crate::queue::BatcherHandle;
pub use crate::sinks::{create_sink, FileSink, FileSinkConfig, LogSink};
pub use contracts::{
    BatchSink, BatcherConfig, ContractError, FailurePolicy, FnSink, Logger, StatsSnapshot,
    TracingLogger,
};
