//! CLI command definitions for google-tasks-to-tasks-org
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.
//! Flags left unset fall back to the layered configuration.

pub mod convert;
pub mod diff;
pub mod list_calendars;

use crate::config::LoggingConfig;
use clap::{Parser, Subcommand};
use convert::ConvertArgs;
use diff::DiffArgs;
use list_calendars::ListCalendarsArgs;

/// Convert a Google Tasks export into a Tasks.org backup
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Logging settings with command-line flags applied over `config`.
    pub fn logging(&self, config: &LoggingConfig) -> LoggingConfig {
        LoggingConfig {
            output: self.log.clone().unwrap_or_else(|| config.output.clone()),
            verbose: self.verbose || config.verbose,
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge the tasks of a Google Tasks export into a Tasks.org backup
    Convert(ConvertArgs),

    /// Compare two JSON files independent of their formatting
    Diff(DiffArgs),

    /// List the calendars of a Tasks.org backup
    ListCalendars(ListCalendarsArgs),
}
