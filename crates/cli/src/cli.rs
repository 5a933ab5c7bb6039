//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Movescreen - movement screen capture and scoring pipeline
#[derive(Parser, Debug)]
#[command(
    name = "movescreen",
    author,
    version,
    about = "Movement screen capture and scoring pipeline",
    long_about = "Captures a short movement screen, extracts per-repetition \n\
                  biomechanical metrics from pose keypoints, submits them to a \n\
                  scoring collaborator, and reconciles the verdicts with coach \n\
                  overrides before persisting the assessment."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MOVESCREEN_VERBOSE")]
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
        env = "MOVESCREEN_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full screening session (mock camera and estimator)
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults are
    /// used when the file does not exist
    #[arg(short, long, default_value = "screen.toml", env = "MOVESCREEN_CONFIG")]
    pub config: PathBuf,

    /// Movement pattern to screen
    #[arg(long, default_value = "squat", env = "MOVESCREEN_PATTERN")]
    pub pattern: String,

    /// Subject identifier
    #[arg(long, default_value = "demo-client", env = "MOVESCREEN_SUBJECT")]
    pub subject: String,

    /// Recording length in seconds before the automatic stop
    #[arg(long, default_value = "6.0")]
    pub duration: f64,

    /// Remote scoring endpoint; the in-process scorer is used when absent
    #[arg(long, env = "MOVESCREEN_SCORING_URL")]
    pub scoring_url: Option<String>,

    /// Skip the save step (stop after reconciliation)
    #[arg(long)]
    pub no_save: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "MOVESCREEN_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running a session
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "screen.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "screen.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show per-pattern depth thresholds
    #[arg(long)]
    pub patterns: bool,
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
