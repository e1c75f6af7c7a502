//! Batcher error types

use thiserror::Error;

use contracts::ContractError;

/// Batcher-specific errors
#[derive(Debug, Error)]
pub enum BatcherError {
    /// Built without a sink
    #[error("batcher '{name}' requires a sink")]
    MissingSink { name: String },

    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Worker thread or runtime could not be started
    #[error("failed to spawn {worker} worker: {source}")]
    Spawn {
        worker: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A flush failed while draining on close
    #[error("drain failed: {0}")]
    Drain(#[source] ContractError),

    /// The dispatcher stopped on a flush failure (stop policy)
    #[error("dispatcher stopped after flush failure: {0}")]
    Stopped(#[source] ContractError),

    /// A worker thread panicked
    #[error("{worker} worker panicked")]
    WorkerPanicked { worker: &'static str },

    /// Sink error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] ContractError),
}

impl BatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The sink error behind a drain or stop failure, if any
    pub fn flush_error(&self) -> Option<&ContractError> {
        match self {
            Self::Drain(e) | Self::Stopped(e) | Self::Contract(e) => Some(e),
            _ => None,
        }
    }
}
