//! Configuration validation
//!
//! Rules:
//! - batcher and sink names are non-empty
//! - batch_size does not exceed buffer_size
//! - file sinks carry a `path` parameter and a boolean `truncate` if present
//!
//! Zero numeric values are legal and mean "use the default".

use contracts::{BatcherBlueprint, ContractError, SinkType};

/// Validate a BatcherBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &BatcherBlueprint) -> Result<(), ContractError> {
    validate_batcher(blueprint)?;
    validate_sink(blueprint)?;
    Ok(())
}

fn validate_batcher(blueprint: &BatcherBlueprint) -> Result<(), ContractError> {
    let batcher = &blueprint.batcher;

    if batcher.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "batcher.name",
            "batcher name cannot be empty",
        ));
    }

    let normalized = batcher.clone().normalized();
    if normalized.batch_size > normalized.buffer_size {
        return Err(ContractError::config_validation(
            "batcher.batch_size / batcher.buffer_size",
            format!(
                "batch_size ({}) must be <= buffer_size ({})",
                normalized.batch_size, normalized.buffer_size
            ),
        ));
    }

    Ok(())
}

fn validate_sink(blueprint: &BatcherBlueprint) -> Result<(), ContractError> {
    let sink = &blueprint.sink;

    if sink.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "sink.name",
            "sink name cannot be empty",
        ));
    }

    if sink.sink_type == SinkType::File {
        match sink.params.get("path") {
            Some(path) if !path.trim().is_empty() => {}
            _ => {
                return Err(ContractError::config_validation(
                    "sink.params.path",
                    format!("file sink '{}' requires a 'path' parameter", sink.name),
                ));
            }
        }

        if let Some(truncate) = sink.params.get("truncate") {
            if truncate != "true" && truncate != "false" {
                return Err(ContractError::config_validation(
                    "sink.params.truncate",
                    format!("truncate must be 'true' or 'false', got '{}'", truncate),
                ));
            }
        }
    }

    Ok(())
}
