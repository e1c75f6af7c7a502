//! BatcherBlueprint - Config Loader output
//!
//! Describes one batcher instance and the sink its batches are routed to.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::BatcherConfig;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete configuration file root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatcherBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Engine settings
    #[serde(default)]
    pub batcher: BatcherConfig,

    /// Output routing
    pub sink: SinkConfig,
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    /// Log sink with no parameters
    pub fn log(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink_type: SinkType::Log,
            params: HashMap::new(),
        }
    }

    /// File sink appending to `path`
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink_type: SinkType::File,
            params: HashMap::from([("path".to_string(), path.into())]),
        }
    }
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log batch summaries
    Log,
    /// Append JSON lines to a file
    File,
}

impl std::fmt::Display for SinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::File => write!(f, "file"),
        }
    }
}
