//! Diff subcommand for google-tasks-to-tasks-org CLI
//!
//! Compares two JSON files, typically a backup before and after conversion.

use crate::config::DiffConfig;
use crate::diff::{ColorChoice, DiffFormat};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the diff subcommand
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Original file
    #[arg(value_name = "TASKS_ORG_FILE")]
    pub original: PathBuf,

    /// File to compare against
    #[arg(value_name = "NEW_FILE")]
    pub new: PathBuf,

    /// Output format: text (default), unified, or summary
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<DiffFormat>,

    /// Context lines for the unified format
    #[arg(short = 'U', long, value_name = "N")]
    pub context: Option<usize>,

    /// When to color the text format
    #[arg(long, value_enum, value_name = "WHEN")]
    pub color: Option<ColorChoice>,
}

/// Diff settings after merging flags and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffSettings {
    pub format: DiffFormat,
    pub context: usize,
    pub color: ColorChoice,
}

impl DiffArgs {
    /// Settings with command-line flags applied over `config`.
    pub fn settings(&self, config: &DiffConfig) -> DiffSettings {
        DiffSettings {
            format: self.format.unwrap_or(config.format),
            context: self.context.unwrap_or(config.context),
            color: self.color.unwrap_or(config.color),
        }
    }
}
