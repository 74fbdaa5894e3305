//! google-tasks-to-tasks-org
//!
//! Merges the tasks of a Google Tasks export into a Tasks.org backup, and
//! compares JSON files independent of their formatting.

use anyhow::{Context, Result};
use clap::Parser;
use google_tasks_to_tasks_org::cli::convert::ConvertArgs;
use google_tasks_to_tasks_org::cli::diff::DiffArgs;
use google_tasks_to_tasks_org::cli::list_calendars::{ListCalendarsArgs, render_calendars};
use google_tasks_to_tasks_org::cli::{Cli, Command};
use google_tasks_to_tasks_org::config::{Config, ConfigLoader, ConfigPaths, LoggingConfig};
use google_tasks_to_tasks_org::convert::convert;
use google_tasks_to_tasks_org::diff::{DiffFormat, JsonDiff};
use google_tasks_to_tasks_org::events::{EventLevel, TracingSink};
use google_tasks_to_tasks_org::io::read_input;
use google_tasks_to_tasks_org::tasks_org::TasksOrgBackup;
use google_tasks_to_tasks_org::transform::PromptResolver;
use std::fs::OpenOptions;
use std::process::ExitCode;
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loader = match load_config(&cli) {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let logging = cli.logging(&loader.config().logging);
    let logging_enabled = match init_logging(&logging) {
        Ok(enabled) => enabled,
        Err(e) => {
            eprintln!("Error: failed to set up logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    debug!(sources = ?loader.sources(), "Loaded configuration.");
    let config = loader.into_config();

    let result = match cli.command {
        Command::Convert(args) => run_convert(&config, &logging, args),
        Command::Diff(args) => run_diff(&config, args),
        Command::ListCalendars(args) => run_list_calendars(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if logging_enabled {
                tracing::error!(error = %format!("{e:#}"), "Error during execution.");
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Load the layered configuration.
///
/// Runs before logging is configured, so warnings about skipped config files
/// go to stderr through a temporary subscriber.
fn load_config(cli: &Cli) -> Result<ConfigLoader> {
    let mut paths = ConfigPaths::discover();
    if let Some(config_path) = &cli.config {
        paths = paths.with_explicit(config_path);
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::with_default(subscriber, || ConfigLoader::load_with_paths(paths))
}

/// Install the global subscriber. Returns whether logging is enabled.
fn init_logging(logging: &LoggingConfig) -> Result<bool> {
    let level = if logging.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match logging.output.as_str() {
        "0" | "off" => {
            // No logging
            return Ok(false);
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)
                .with_context(|| format!("Failed to open log file {filename}"))?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(true)
}

fn run_convert(config: &Config, logging: &LoggingConfig, args: ConvertArgs) -> Result<()> {
    // Settle the options before touching any file.
    let options = args.options(&config.convert)?;
    let output = args.output(&config.convert, logging)?;
    debug!(
        calendar_uuid = %options.calendar_uuid,
        due_time_handling = %options.due_time_handling,
        out = %output,
        "Converting."
    );

    let export = read_input(&args.google_tasks).with_context(|| {
        format!(
            "Failed to read Google Tasks export {}",
            args.google_tasks.display()
        )
    })?;
    let backup = read_input(&args.tasks_org).with_context(|| {
        format!(
            "Failed to read Tasks.org backup {}",
            args.tasks_org.display()
        )
    })?;

    let sink = TracingSink::new().with_min_level(if logging.verbose {
        EventLevel::Debug
    } else {
        EventLevel::Info
    });
    let mut resolver = PromptResolver::new(std::io::stdin().lock(), std::io::stderr());

    let converted = convert(&export, &backup, &options, &mut resolver, &sink).with_context(|| {
        format!(
            "Failed to convert {} into {}",
            args.google_tasks.display(),
            args.tasks_org.display()
        )
    })?;

    output
        .write(&converted.bytes)
        .with_context(|| format!("Failed to write {output}"))?;

    info!(
        out = %output,
        added_tasks = converted.report.added,
        skipped_tasks = converted.report.skipped,
        "Wrote Tasks.org backup."
    );
    Ok(())
}

fn run_diff(config: &Config, args: DiffArgs) -> Result<()> {
    let settings = args.settings(&config.diff);

    let original = read_input(&args.original)
        .with_context(|| format!("Failed to read {}", args.original.display()))?;
    let new = read_input(&args.new)
        .with_context(|| format!("Failed to read {}", args.new.display()))?;

    let diff = JsonDiff::new(
        args.original.display().to_string(),
        &original,
        args.new.display().to_string(),
        &new,
    )
    .with_context(|| {
        format!(
            "Failed to compare {} and {}",
            args.original.display(),
            args.new.display()
        )
    })?;

    // Output based on format
    match settings.format {
        DiffFormat::Text => print!("{}", diff.render_full(settings.color.enabled())),
        DiffFormat::Unified => print!("{}", diff.render_unified(settings.context)),
        DiffFormat::Summary => print!("{}", diff.render_summary()),
    }

    debug!(summary = ?diff.summary(), "Diff finished.");
    Ok(())
}

fn run_list_calendars(args: ListCalendarsArgs) -> Result<()> {
    let bytes = read_input(&args.tasks_org).with_context(|| {
        format!(
            "Failed to read Tasks.org backup {}",
            args.tasks_org.display()
        )
    })?;
    let doc = TasksOrgBackup::parse(&bytes).with_context(|| {
        format!(
            "Failed to parse Tasks.org backup {}",
            args.tasks_org.display()
        )
    })?;

    print!("{}", render_calendars(&doc.calendars));
    Ok(())
}
