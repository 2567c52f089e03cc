//! Riftscore CLI - Command-line interface for Riftscore
//!
//! Provides commands for:
//! - Downloading match history into bulk segments
//! - Downloading recent match timelines
//! - Scoring stored segments into power levels
//! - Querying a player's power levels
//! - Probing the upstream quota
//! - Viewing and validating configuration

use anyhow::Result;
use clap::{Parser, Subcommand};
use riftscore_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    config::ConfigCommand, context::CliContext, download::DownloadCommand,
    power_level::PowerLevelCommand, quota::QuotaCommand, score::ScoreCommand,
    timelines::TimelinesCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "riftscore",
    version,
    about = "League of Legends match telemetry and power level scoring"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print Prometheus metrics after the command finishes
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download match history into bulk segments
    Download(DownloadCommand),
    /// Download the timelines of a player's most recent matches
    Timelines(TimelinesCommand),
    /// Score every stored match segment of a player
    Score(ScoreCommand),
    /// Show a player's stored power levels
    PowerLevel(PowerLevelCommand),
    /// Make one probe call and show the learned quota windows
    Quota(QuotaCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Picks the log filter: `RUST_LOG` first, then `-v`/`--quiet`, then the
/// configured level.
fn log_filter(verbose: u8, quiet: bool, logging: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = match (verbose, quiet) {
        (0, true) => "warn",
        (0, false) => logging.level.as_str(),
        (1, _) => "debug",
        _ => "trace",
    };
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_tracing(filter: EnvFilter, json: bool) {
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = OutputFormat::from_json_flag(cli.json);

    let ctx = CliContext::load(cli.config.as_deref(), format, cli.quiet, cli.metrics)?;

    init_tracing(
        log_filter(cli.verbose, cli.quiet, &ctx.config.logging),
        ctx.config.logging.json,
    );

    let result = match cli.command {
        Commands::Download(cmd) => cmd.execute(&ctx).await,
        Commands::Timelines(cmd) => cmd.execute(&ctx).await,
        Commands::Score(cmd) => cmd.execute(&ctx).await,
        Commands::PowerLevel(cmd) => cmd.execute(&ctx).await,
        Commands::Quota(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
    };

    ctx.print_metrics()?;
    result
}
