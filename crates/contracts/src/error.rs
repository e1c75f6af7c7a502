//! Layered error definitions
//!
//! Categorized by source: config / sink / general

use thiserror::Error;

/// Boxed error returned by caller-supplied sink functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Sink Errors =====
    /// The sink rejected a whole batch
    #[error("sink '{sink_name}' flush of {items} items failed: {source}")]
    SinkFlush {
        sink_name: String,
        items: usize,
        #[source]
        source: BoxError,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink flush error
    pub fn sink_flush(
        sink_name: impl Into<String>,
        items: usize,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::SinkFlush {
            sink_name: sink_name.into(),
            items,
            source: source.into(),
        }
    }
}
