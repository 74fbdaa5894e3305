//! Layered configuration.
//!
//! Defaults for command-line options come from four tiers, merged
//! field-by-field (later tiers win):
//! 1. **Defaults** - built into the binary
//! 2. **Project** - `./.gtto/config.yaml`
//! 3. **User** - `<config dir>/gtto/config.yaml`
//! 4. **Environment** - the variables below
//!
//! Command-line flags override all of them.
//!
//! ## Environment Variables
//! - `GTTO_CONFIG_PATH` - Explicit config file (replaces the project and user tiers)
//! - `GTTO_PROJECT_DIR` - Project config dir (default: `./.gtto`)
//! - `GTTO_USER_DIR` - User config dir (default: `<config dir>/gtto`)
//! - `GTTO_CALENDAR_UUID` - Calendar for new tasks
//! - `GTTO_DUE_TIME_HANDLING` - `day`, `time` or `ask`
//! - `GTTO_OUT` - Output file, `-` for stdout
//! - `GTTO_PRETTY` - `1`/`true`/`yes` to indent output

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
