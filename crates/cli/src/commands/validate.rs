//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{BatcherBlueprint, FailurePolicy, SinkType};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    batcher: String,
    buffer_size: usize,
    batch_size: usize,
    flush_interval_ms: u64,
    failure_policy: FailurePolicy,
    sink: String,
    sink_type: SinkType,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            // Report the values the engine will actually run with
            let batcher = blueprint.batcher.clone().normalized();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    batcher: batcher.name,
                    buffer_size: batcher.buffer_size,
                    batch_size: batcher.batch_size,
                    flush_interval_ms: batcher.flush_interval_ms,
                    failure_policy: batcher.failure_policy,
                    sink: blueprint.sink.name.clone(),
                    sink_type: blueprint.sink.sink_type,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &BatcherBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();
    let batcher = &blueprint.batcher;

    for (field, value) in [
        ("buffer_size", batcher.buffer_size as u64),
        ("batch_size", batcher.batch_size as u64),
        ("flush_interval_ms", batcher.flush_interval_ms),
    ] {
        if value == 0 {
            warnings.push(format!("batcher.{field} is 0 - using the default"));
        }
    }

    if batcher.failure_policy == FailurePolicy::Retry && batcher.retry_backoff_ms == 0 {
        warnings.push(
            "batcher.retry_backoff_ms is 0 - failed flushes are retried without pause".to_string(),
        );
    }

    if blueprint.sink.sink_type == SinkType::Log {
        warnings.push(format!(
            "Sink '{}' only logs batch summaries - items are not persisted",
            blueprint.sink.name
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Batcher: {}", summary.batcher);
            println!("  Buffer size: {}", summary.buffer_size);
            println!("  Batch size: {}", summary.batch_size);
            println!("  Flush interval: {} ms", summary.flush_interval_ms);
            println!("  Failure policy: {:?}", summary.failure_policy);
            println!("  Sink: {} ({})", summary.sink, summary.sink_type);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
