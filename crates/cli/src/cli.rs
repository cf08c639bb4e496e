//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Crosslight - adaptive four-way traffic signal controller
#[derive(Parser, Debug)]
#[command(
    name = "crosslight",
    author,
    version,
    about = "Adaptive four-way traffic signal controller",
    long_about = "An adaptive traffic signal controller for a four-way intersection.\n\n\
                  Cycles right of way clockwise, sizes green phases from observed\n\
                  vehicle density, and preempts the cycle with an all-red blink when\n\
                  an emergency vehicle is detected."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CROSSLIGHT_VERBOSE")]
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
        env = "CROSSLIGHT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the signal controller
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "CROSSLIGHT_CONFIG")]
    pub config: PathBuf,

    /// Run duration in seconds (0 = run until interrupted)
    #[arg(long, default_value = "0", env = "CROSSLIGHT_DURATION")]
    pub duration: u64,

    /// Stop after this many completed phases (0 = unlimited)
    #[arg(long, default_value = "0", env = "CROSSLIGHT_MAX_PHASES")]
    pub max_phases: u64,

    /// Validate configuration and exit without running the controller
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "CROSSLIGHT_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show per-approach wiring details
    #[arg(long)]
    pub approaches: bool,
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
