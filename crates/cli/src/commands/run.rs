//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use contracts::BatcherBlueprint;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }
    if args.producers == 0 {
        return Err(CliError::invalid_args("--producers must be at least 1").into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args);

    info!(
        batcher = %blueprint.batcher.name,
        buffer_size = blueprint.batcher.buffer_size,
        batch_size = blueprint.batcher.batch_size,
        flush_interval_ms = blueprint.batcher.flush_interval_ms,
        sink = %blueprint.sink.name,
        sink_type = %blueprint.sink.sink_type,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        producers: args.producers,
        items_per_producer: if args.items == 0 {
            None
        } else {
            Some(args.items)
        },
        rate: if args.rate == 0 {
            None
        } else {
            Some(args.rate)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        report_interval: Duration::from_secs(args.report_interval.max(1)),
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    });

    info!("Starting pipeline...");

    let stats = pipeline
        .run(setup_shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        emitted = stats.emitted,
        sent = stats.batcher.sent,
        dropped = stats.batcher.dropped,
        duration_secs = stats.duration.as_secs_f64(),
        throughput = format!("{:.2}", stats.throughput()),
        "Pipeline completed"
    );
    stats.print_summary();

    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(blueprint: &mut BatcherBlueprint, args: &RunArgs) {
    if let Some(batch_size) = args.batch_size {
        info!(batch_size, "Overriding batch_size from CLI");
        blueprint.batcher.batch_size = batch_size;
    }
    if let Some(buffer_size) = args.buffer_size {
        info!(buffer_size, "Overriding buffer_size from CLI");
        blueprint.batcher.buffer_size = buffer_size;
    }
    if let Some(flush_interval_ms) = args.flush_interval_ms {
        info!(flush_interval_ms, "Overriding flush_interval_ms from CLI");
        blueprint.batcher.flush_interval_ms = flush_interval_ms;
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &BatcherBlueprint) {
    let batcher = blueprint.batcher.clone().normalized();

    println!("\n=== Configuration Summary ===\n");
    println!("Batcher: {}", batcher.name);
    println!("  Buffer size: {}", batcher.buffer_size);
    println!("  Batch size: {}", batcher.batch_size);
    println!("  Flush interval: {} ms", batcher.flush_interval_ms);
    println!("  Failure policy: {:?}", batcher.failure_policy);
    println!("  Retry backoff: {} ms", batcher.retry_backoff_ms);

    println!("\nSink: {} ({})", blueprint.sink.name, blueprint.sink.sink_type);
    let mut params: Vec<_> = blueprint.sink.params.iter().collect();
    params.sort();
    for (key, value) in params {
        println!("  {}: {}", key, value);
    }

    println!();
}
