//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Activity Loader - batched delivery of activity records to an ingestion API
#[derive(Parser, Debug)]
#[command(
    name = "activity-loader",
    author,
    version,
    about = "Batched, retried delivery of activity records to an HTTP ingestion API",
    long_about = "Reads a delimited activity file, cleans and normalizes the records, \n\
                  splits them into batches and POSTs the batches concurrently with \n\
                  exponential-backoff retries. Exits non-zero if any batch fails."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ACTIVITY_LOADER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ACTIVITY_LOADER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transform an input file and deliver it in batches
    Send(SendArgs),

    /// Validate configuration file without sending anything
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),
}

/// Arguments for the `send` command
#[derive(Parser, Debug, Clone)]
pub struct SendArgs {
    /// Input file (delimited, header row required)
    #[arg(short, long, env = "ACTIVITY_LOADER_FILE")]
    pub file: PathBuf,

    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "ACTIVITY_LOADER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Keep only rows where `key=value`
    #[arg(long, env = "ACTIVITY_LOADER_FILTER")]
    pub filter: Option<String>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    /// Transform and batch the input, then exit without sending
    #[arg(long)]
    pub dry_run: bool,

    /// Write the run report as JSON to this path
    #[arg(long, env = "ACTIVITY_LOADER_REPORT_JSON")]
    pub report_json: Option<PathBuf>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "ACTIVITY_LOADER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Command-line overrides of configuration file values
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override the ingestion endpoint URL
    #[arg(long, env = "ACTIVITY_LOADER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Override the authorization token
    #[arg(long, env = "ACTIVITY_LOADER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Records per request
    #[arg(long, env = "ACTIVITY_LOADER_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    /// Maximum batches in flight
    #[arg(long, env = "ACTIVITY_LOADER_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Retries per batch after the first attempt
    #[arg(long, env = "ACTIVITY_LOADER_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Input field delimiter
    #[arg(long, env = "ACTIVITY_LOADER_DELIMITER")]
    pub delimiter: Option<char>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "activity-loader.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; defaults apply when omitted
    #[arg(short, long, env = "ACTIVITY_LOADER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    /// Output as JSON instead of TOML
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
