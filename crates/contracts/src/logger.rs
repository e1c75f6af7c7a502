//! Leveled logger collaborator
//!
//! The batcher reports flush failures and drain progress through this narrow
//! interface only. Logging never drives control flow.

use std::fmt;

use tracing::Level;

/// Leveled logger taking preformatted arguments
pub trait Logger: Send + Sync {
    /// Emit one record at `level`
    fn log(&self, level: Level, args: fmt::Arguments<'_>);

    fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Level::TRACE, args);
    }

    fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::DEBUG, args);
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::INFO, args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::WARN, args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::ERROR, args);
    }
}

/// Default logger: forwards to `tracing` with a `component` field
#[derive(Debug, Clone)]
pub struct TracingLogger {
    prefix: String,
}

impl TracingLogger {
    /// Create a logger tagging every record with `prefix`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Component prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let component = self.prefix.as_str();
        if level == Level::TRACE {
            tracing::trace!(component, "{}", args);
        } else if level == Level::DEBUG {
            tracing::debug!(component, "{}", args);
        } else if level == Level::INFO {
            tracing::info!(component, "{}", args);
        } else if level == Level::WARN {
            tracing::warn!(component, "{}", args);
        } else {
            tracing::error!(component, "{}", args);
        }
    }
}
