//! Convert subcommand for google-tasks-to-tasks-org CLI
//!
//! Merges a Google Tasks export into a Tasks.org backup.

use crate::config::{ConvertConfig, LoggingConfig};
use crate::convert::ConvertOptions;
use crate::io::Output;
use crate::transform::DueTimeHandling;
use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the convert subcommand
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Google Tasks export (Takeout `Tasks.json`, optionally gzipped)
    #[arg(value_name = "GOOGLE_TASKS_FILE")]
    pub google_tasks: PathBuf,

    /// Tasks.org backup to merge into (optionally gzipped)
    #[arg(value_name = "TASKS_ORG_FILE")]
    pub tasks_org: PathBuf,

    /// Output file, or - for stdout
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<String>,

    /// Calendar for the new tasks, see $.data.caldavCalendars[*].uuid or list-calendars
    #[arg(long, value_name = "UUID")]
    pub calendar_uuid: Option<String>,

    /// How to convert tasks due at 22:00:00Z
    #[arg(long, value_enum, value_name = "HANDLING")]
    pub due_time_handling: Option<DueTimeHandling>,

    /// Indent the output
    #[arg(long)]
    pub pretty: bool,
}

impl ConvertArgs {
    /// Conversion options with command-line flags applied over `config`.
    pub fn options(&self, config: &ConvertConfig) -> Result<ConvertOptions> {
        let Some(calendar_uuid) = self
            .calendar_uuid
            .clone()
            .or_else(|| config.calendar_uuid.clone())
        else {
            bail!(
                "No calendar selected. Pass --calendar-uuid or set convert.calendar_uuid; \
                 'list-calendars {}' shows the available ones",
                self.tasks_org.display()
            );
        };

        Ok(ConvertOptions::new(calendar_uuid)
            .with_due_time_handling(
                self.due_time_handling
                    .unwrap_or(config.due_time_handling),
            )
            .with_pretty(self.pretty || config.pretty))
    }

    /// Output destination with command-line flags applied over `config`.
    ///
    /// Standard output cannot carry both the backup and the log.
    pub fn output(&self, config: &ConvertConfig, logging: &LoggingConfig) -> Result<Output> {
        let output = Output::parse(self.out.as_deref().unwrap_or(&config.out));
        if output == Output::Stdout && logging.writes_to_stdout() {
            bail!(
                "Both the backup and the log would go to stdout. \
                 Pass --out FILE or log elsewhere with --log"
            );
        }
        Ok(output)
    }
}
