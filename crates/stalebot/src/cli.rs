//! Command-line interface definitions using clap.

use crate::config::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stale Ticket Bot
///
/// Warns tickets that saw no activity for a while and finalizes them
/// (close, unassign or deprioritize) once the grace period has passed.
/// The tracker token is read from the environment variable named by
/// `token_env` in the configuration file (JIRA_TOKEN by default).
///
/// Exit Codes:
///   0  - Command succeeded
///   1  - Generic error occurred
///   2  - Invalid configuration or arguments
///   4  - A warned ticket lost its warning label mid-run
///  10  - Tracker request failed (HTTP, transport, unexpected response)
#[derive(Parser)]
#[command(name = "stalebot")]
#[command(about = "Stale ticket bot", long_about = None)]
pub struct Cli {
    /// Only log warnings and errors (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured rules against the tracker
    ///
    /// Each rule first finalizes tickets whose grace period ran out, then
    /// warns new candidates. With --dry-run every mutation is logged
    /// instead of sent, and no token is needed.
    Run {
        /// Configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Log mutations instead of performing them
        #[arg(long)]
        dry_run: bool,

        /// Only run the named rule (repeatable)
        #[arg(long = "rule", value_name = "NAME")]
        rules: Vec<String>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration file without contacting the tracker
    CheckConfig {
        /// Configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },

    /// List configured rules and the queries they run
    ListRules {
        /// Configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
