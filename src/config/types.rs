//! Configuration types and structures.

use crate::diff::{ColorChoice, DiffFormat};
use crate::transform::DueTimeHandling;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub convert: ConvertConfig,

    #[serde(default)]
    pub diff: DiffConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load a single configuration file without tier merging.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        // Empty or comment-only YAML parses as null
        let config: Option<Config> = serde_yaml::from_str(&content)?;
        Ok(config.unwrap_or_default())
    }
}

/// Defaults for the `convert` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Calendar new tasks are bound to, `$.data.caldavCalendars[*].uuid`.
    #[serde(default)]
    pub calendar_uuid: Option<String>,

    /// How to convert tasks due at 22:00:00Z (default: ask).
    #[serde(default)]
    pub due_time_handling: DueTimeHandling,

    /// Output file, or "-" for stdout.
    #[serde(default = "default_out")]
    pub out: String,

    /// Indent the output document.
    #[serde(default)]
    pub pretty: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            calendar_uuid: None,
            due_time_handling: DueTimeHandling::default(),
            out: default_out(),
            pretty: false,
        }
    }
}

fn default_out() -> String {
    "-".to_string()
}

/// Defaults for the `diff` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffConfig {
    #[serde(default)]
    pub format: DiffFormat,

    /// Context lines for the unified format.
    #[serde(default = "default_context")]
    pub context: usize,

    #[serde(default)]
    pub color: ColorChoice,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            format: DiffFormat::default(),
            context: default_context(),
            color: ColorChoice::default(),
        }
    }
}

fn default_context() -> usize {
    3
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 0/off, 1/stdout, 2/stderr, or a file name.
    #[serde(default = "default_log")]
    pub output: String,

    /// Log at debug level.
    #[serde(default)]
    pub verbose: bool,
}

impl LoggingConfig {
    /// Whether log lines go to standard output.
    pub fn writes_to_stdout(&self) -> bool {
        matches!(self.output.as_str(), "1" | "stdout")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            output: default_log(),
            verbose: false,
        }
    }
}

fn default_log() -> String {
    "2".to_string()
}
