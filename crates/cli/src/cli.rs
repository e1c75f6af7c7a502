//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Batcher - drive a batching engine with synthetic load
#[derive(Parser, Debug)]
#[command(
    name = "batcher",
    author,
    version,
    about = "Batching engine driver",
    long_about = "Loads a batcher configuration, builds the configured sink and feeds it\n\
                  synthetic events from concurrent producers, reporting throughput,\n\
                  drops and flush statistics."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "BATCHER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "BATCHER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run producers against the configured batcher
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "batcher.toml", env = "BATCHER_CONFIG")]
    pub config: PathBuf,

    /// Number of concurrent producer threads
    #[arg(short, long, default_value = "4", env = "BATCHER_PRODUCERS")]
    pub producers: usize,

    /// Items emitted by each producer (0 = until interrupted)
    #[arg(short = 'n', long, default_value = "10000", env = "BATCHER_ITEMS")]
    pub items: u64,

    /// Items per second per producer (0 = unthrottled)
    #[arg(long, default_value = "0", env = "BATCHER_RATE")]
    pub rate: u64,

    /// Override batcher.batch_size from configuration
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override batcher.buffer_size from configuration
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Override batcher.flush_interval_ms from configuration
    #[arg(long)]
    pub flush_interval_ms: Option<u64>,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "BATCHER_TIMEOUT")]
    pub timeout: u64,

    /// Seconds between periodic stats reports
    #[arg(long, default_value = "5")]
    pub report_interval: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "BATCHER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "batcher.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["batcher", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("batcher.toml"));
                assert_eq!(args.producers, 4);
                assert_eq!(args.items, 10_000);
                assert_eq!(args.rate, 0);
                assert!(args.batch_size.is_none());
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "batcher",
            "-vv",
            "run",
            "-c",
            "load.json",
            "-p",
            "8",
            "-n",
            "0",
            "--batch-size",
            "50",
            "--flush-interval-ms",
            "200",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.producers, 8);
        assert_eq!(args.items, 0);
        assert_eq!(args.batch_size, Some(50));
        assert_eq!(args.flush_interval_ms, Some(200));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["batcher", "-q", "-v", "validate"]).is_err());
    }
}
