//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Command-line arguments rejected
    #[error("Invalid arguments: {message}")]
    InvalidArgs { message: String },

    /// Worker thread or task failure
    #[error("Pipeline execution failed: {message}")]
    PipelineExecution { message: String },

    /// The batcher did not shut down cleanly
    #[error("Error during shutdown: {0}")]
    Shutdown(#[from] batcher::BatcherError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs {
            message: message.into(),
        }
    }

    pub fn pipeline_execution(message: impl Into<String>) -> Self {
        Self::PipelineExecution {
            message: message.into(),
        }
    }
}
