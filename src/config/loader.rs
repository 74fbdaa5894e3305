//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use crate::transform::DueTimeHandling;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Built-in defaults (lowest priority)
    Defaults = 0,
    /// Project-level config (`./.gtto/`)
    Project = 1,
    /// User-level config (`~/.config/gtto/`)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Paths for each configuration tier.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
    /// Single file replacing the project and user tiers
    pub explicit: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        Self::discover_with(|key| std::env::var(key).ok())
    }

    fn discover_with(env: impl Fn(&str) -> Option<String>) -> Self {
        // Project dir: GTTO_PROJECT_DIR or $CWD/.gtto
        let project_dir = env("GTTO_PROJECT_DIR")
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from(".gtto")));

        // User dir: GTTO_USER_DIR or <config dir>/gtto
        let user_dir = env("GTTO_USER_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("gtto")));

        Self {
            project_dir,
            user_dir,
            explicit: env("GTTO_CONFIG_PATH").map(PathBuf::from),
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
            explicit: None,
        }
    }

    /// Use a single configuration file instead of the project and user tiers.
    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    fn tier_file(&self, tier: ConfigTier) -> Option<PathBuf> {
        let dir = match tier {
            ConfigTier::Project => self.project_dir.as_ref(),
            ConfigTier::User => self.user_dir.as_ref(),
            ConfigTier::Defaults | ConfigTier::Environment => None,
        }?;
        Some(dir.join(CONFIG_FILE))
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Loaded configuration
    config: Config,
    /// Config files that contributed, lowest tier first
    sources: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        Self::load_with_env(paths, |key| std::env::var(key).ok())
    }

    /// Load configuration, reading environment overrides through `env`.
    pub fn load_with_env(paths: ConfigPaths, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut sources = Vec::new();

        let mut config = if let Some(explicit) = &paths.explicit {
            // An explicitly named file must exist and parse
            let config = Config::load(explicit)
                .with_context(|| format!("Failed to load config file {}", explicit.display()))?;
            sources.push(explicit.clone());
            config
        } else {
            // Tier 1: Defaults
            let mut configs: Vec<Value> = vec![serde_json::to_value(Config::default())?];

            // Tiers 2 and 3: Project, then user
            for tier in [ConfigTier::Project, ConfigTier::User] {
                let Some(file) = paths.tier_file(tier) else {
                    continue;
                };
                if let Some(value) = read_tier(tier, &file) {
                    configs.push(value);
                    sources.push(file);
                }
            }

            let merged = deep_merge_all(configs);
            serde_json::from_value(merged).context("Invalid configuration")?
        };

        // Tier 4: Environment variable overrides
        Self::apply_env_overrides(&mut config, env)?;

        Ok(Self { config, sources })
    }

    /// Apply environment variable overrides to config.
    fn apply_env_overrides(config: &mut Config, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(uuid) = env("GTTO_CALENDAR_UUID") {
            config.convert.calendar_uuid = Some(uuid);
        }

        if let Some(handling) = env("GTTO_DUE_TIME_HANDLING") {
            config.convert.due_time_handling = handling
                .parse::<DueTimeHandling>()
                .map_err(anyhow::Error::msg)
                .context("Invalid GTTO_DUE_TIME_HANDLING")?;
        }

        if let Some(out) = env("GTTO_OUT") {
            config.convert.out = out;
        }

        if let Some(pretty) = env("GTTO_PRETTY") {
            config.convert.pretty = matches!(pretty.as_str(), "1" | "true" | "yes");
        }

        Ok(())
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Config files that contributed to the result, lowest tier first.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

/// Read one tier's file. Missing files are normal, broken ones are skipped.
fn read_tier(tier: ConfigTier, file: &Path) -> Option<Value> {
    if !file.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            warn!(%tier, path = %file.display(), error = %e, "Skipping unreadable config file");
            return None;
        }
    };
    // The file must also hold valid values on its own.
    let parsed = serde_yaml::from_str::<Value>(&content)
        .map_err(anyhow::Error::from)
        .and_then(|value| {
            serde_json::from_value::<Option<Config>>(value.clone())?;
            Ok(value)
        });
    match parsed {
        Ok(value) => {
            debug!(%tier, path = %file.display(), "Loaded config file");
            Some(value)
        }
        Err(e) => {
            warn!(%tier, path = %file.display(), error = %e, "Skipping invalid config file");
            None
        }
    }
}
