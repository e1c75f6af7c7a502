//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `BatcherBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("batcher.toml")).unwrap();
//! println!("Sink: {}", blueprint.sink.name);
//! ```

mod parser;
mod validator;

pub use contracts::BatcherBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<BatcherBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<BatcherBlueprint, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize BatcherBlueprint to TOML string
    pub fn to_toml(blueprint: &BatcherBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize BatcherBlueprint to JSON string
    pub fn to_json(blueprint: &BatcherBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<BatcherBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{FailurePolicy, SinkType};

    const MINIMAL_TOML: &str = r#"
[batcher]
name = "events"
buffer_size = 5000
batch_size = 250
flush_interval_ms = 500
failure_policy = "stop"

[sink]
name = "events_file"
sink_type = "file"
[sink.params]
path = "/tmp/events.jsonl"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.batcher.name, "events");
        assert_eq!(bp.batcher.batch_size, 250);
        assert_eq!(bp.batcher.failure_policy, FailurePolicy::Stop);
        assert_eq!(bp.sink.sink_type, SinkType::File);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.batcher, bp2.batcher);
        assert_eq!(bp.sink.params, bp2.sink.params);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.batcher, bp2.batcher);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[batcher]
buffer_size = 10
batch_size = 100

[sink]
name = "log"
sink_type = "log"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("batch_size"));
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let path = std::env::temp_dir().join(format!("config_loader_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "sink": { "name": "log", "sink_type": "log" } }"#).unwrap();

        let bp = ConfigLoader::load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(bp.sink.name, "log");
        assert_eq!(bp.batcher, contracts::BatcherConfig::default());
    }

    #[test]
    fn test_load_from_path_rejects_unknown_extension() {
        let err = ConfigLoader::load_from_path(Path::new("batcher.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
