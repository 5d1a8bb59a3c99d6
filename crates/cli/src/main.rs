//! # Bounty Warden CLI
//!
//! Command-line interface for scoring the conversation on a closed issue and
//! generating the reward permits of its contributors.
//!
//! # Commands
//!
//! - `score` - Score an issue, from GitHub or from a JSON snapshot
//! - `config` - Create and validate configuration files
//!
//! # Examples
//!
//! ```bash
//! # Score an issue and its linked pull request, without posting anything
//! bounty-warden score --repo owner/repo --issue 123 --pull-request 124
//!
//! # Score, sign permits and post the summary on the issue
//! bounty-warden score --repo owner/repo --issue 123 --sign --post
//!
//! # Score a snapshot offline
//! bounty-warden score --snapshot issue-123.json --format json
//!
//! # Initialize configuration
//! bounty-warden config init
//! ```

#![deny(missing_docs)]

use clap::{Parser, Subcommand};
use tracing::{error, info, instrument};

/// Command implementations for the CLI.
mod commands;

/// Configuration file handling for the CLI.
mod config;

/// Error types specific to the CLI.
mod errors;

use commands::{config_cmd::ConfigCommands, score::ScoreArgs};
use errors::CliError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Command-line interface structure for Bounty Warden.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands for the Bounty Warden CLI.
#[derive(Subcommand)]
enum Commands {
    /// Score the contributions to an issue
    Score(ScoreArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Main entry point for the Bounty Warden CLI.
///
/// Initializes logging from `BOUNTY_WARDEN_LOG`, parses the command line and
/// dispatches to the command handler.
///
/// # Errors
///
/// Each `CliError` variant maps onto its own process exit code.
#[tokio::main]
#[instrument]
async fn main() -> Result<(), CliError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("BOUNTY_WARDEN_LOG"))
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Score(args) => {
            if let Err(e) = commands::score::execute(args).await {
                error!("Error scoring the issue: {}", e);
                return Err(e);
            }
        }
        Commands::Config(cmd) => {
            if let Err(e) = commands::config_cmd::execute(cmd).await {
                error!("Error executing config command: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}
