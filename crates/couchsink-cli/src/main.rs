//! couchsink CLI - Command-line host for the sink task
//!
//! Provides commands for:
//! - Writing newline-delimited JSON records into the document store
//! - Showing and validating the configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{config::ConfigCommand, run::RunCommand};
use couchsink_core::config::{Config, LoggingConfig};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "couchsink",
    version,
    about = "Relay stream records into a revision-controlled document store"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write records from a file or stdin into the store
    Run(RunCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Installs the global subscriber
///
/// `RUST_LOG` takes precedence; otherwise `-v` raises the configured level.
fn init_tracing(logging: &LoggingConfig, verbose: u8) {
    let level = match verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    init_tracing(&Config::load_or_default(&config_path).logging, cli.verbose);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Run(cmd) => cmd.execute(&config_path, format).await,
        Commands::Config(cmd) => cmd.execute(&config_path, format).await,
    }
}
