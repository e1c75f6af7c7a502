//! # Contracts
//!
//! Frozen interface contracts shared by the batcher, its loaders and its tools.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Item model
//! - Batches are homogeneous: one batcher instance carries one item type `T`
//! - Sinks see `&[T]` in append order and never run concurrently

mod blueprint;
mod config;
mod error;
mod logger;
mod sink;
mod stats;

pub use blueprint::*;
pub use config::*;
pub use error::*;
pub use logger::{Logger, TracingLogger};
pub use sink::*;
pub use stats::StatsSnapshot;

pub use tracing::Level;
