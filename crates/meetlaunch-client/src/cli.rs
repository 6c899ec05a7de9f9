//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use meetlaunch_core::TracingOutputFormat;

use crate::config::ClientConfig;

/// meetlaunch - join your next meeting from the terminal
#[derive(Debug, Parser)]
#[command(name = "meetlaunch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "MEETLAUNCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log output format on stderr (pretty, compact, json)
    #[arg(long, env = "MEETLAUNCH_LOG_FORMAT", default_value_t = TracingOutputFormat::Compact)]
    pub log_format: TracingOutputFormat,

    // --- Lookup flags ---
    /// Only consider meetings starting within this many minutes
    #[arg(long, env = "MEETLAUNCH_LOOKAHEAD_MINUTES", conflicts_with = "no_lookahead")]
    pub lookahead_minutes: Option<u32>,

    /// Search without an upper bound
    #[arg(long)]
    pub no_lookahead: bool,

    // --- Google flags ---
    /// OAuth client registration file
    #[arg(long, env = "MEETLAUNCH_CREDENTIALS_FILE")]
    pub credentials_file: Option<PathBuf>,

    /// Token cache location
    #[arg(long, env = "MEETLAUNCH_TOKEN_PATH")]
    pub token_path: Option<PathBuf>,

    /// Calendar to query
    #[arg(long, env = "MEETLAUNCH_CALENDAR_ID")]
    pub calendar_id: Option<String>,

    // --- Output flags ---
    /// Print the launch URI instead of opening it
    #[arg(long, group = "output_mode")]
    pub print_only: bool,

    /// Print the meeting as JSON instead of opening it
    #[arg(long, group = "output_mode")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Overlays flags (and their environment variables) on top of `config`.
    pub fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(ref path) = self.credentials_file {
            config.google.credentials_file = Some(path.clone());
        }
        if let Some(ref path) = self.token_path {
            config.google.token_path = Some(path.clone());
        }
        if let Some(ref id) = self.calendar_id {
            config.google.calendar_id = Some(id.clone());
        }
        if self.no_lookahead {
            config.lookup.lookahead_minutes = 0;
        } else if let Some(minutes) = self.lookahead_minutes {
            config.lookup.lookahead_minutes = minutes;
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authorize access to Google Calendar and cache the token
    Auth,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Dump,

    /// Show the configuration file path
    Path,
}
