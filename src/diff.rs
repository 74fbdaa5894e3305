//! Comparing two JSON documents independent of their formatting.
//!
//! A plain `git diff --no-index` is of little use on backups, because the
//! converted file is not necessarily formatted like the original. Both
//! documents are parsed, re-serialized with sorted keys and two-space
//! indentation, and the resulting texts are compared line by line.

use crate::error::{ConvertError, ConvertResult};
use crate::tasks_org::TasksOrgBackup;
use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use similar::{ChangeTag, TextDiff};
use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::io::IsTerminal;

/// Output format for diff results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffFormat {
    /// Whole document, changed lines marked
    #[default]
    Text,
    /// Unified diff with context lines
    Unified,
    /// Line and task counts only
    Summary,
}

impl std::str::FromStr for DiffFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(DiffFormat::Text),
            "unified" => Ok(DiffFormat::Unified),
            "summary" => Ok(DiffFormat::Summary),
            _ => Err(format!(
                "Invalid format '{}'. Valid options: text, unified, summary",
                s
            )),
        }
    }
}

impl fmt::Display for DiffFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffFormat::Text => write!(f, "text"),
            DiffFormat::Unified => write!(f, "unified"),
            DiffFormat::Summary => write!(f, "summary"),
        }
    }
}

/// When to color diff output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Color when standard output is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn enabled(self) -> bool {
        match self {
            ColorChoice::Auto => std::io::stdout().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

/// Parse JSON and re-serialize it in a stable form.
pub fn canonicalize(bytes: &[u8], what: &'static str) -> ConvertResult<String> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| ConvertError::format(what, format!("unmarshal json: {e}")))?;
    serde_json::to_string_pretty(&sort_keys(value)).map_err(ConvertError::Serialization)
}

/// Recursively order object keys alphabetically.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Line counts of a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub inserted: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl DiffSummary {
    pub fn is_identical(&self) -> bool {
        self.inserted == 0 && self.deleted == 0
    }
}

/// Remote IDs that differ between the task lists of two backups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskIdChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl TaskIdChanges {
    pub fn between(original: &TasksOrgBackup, new: &TasksOrgBackup) -> Self {
        let before: HashSet<&str> = original.remote_ids().collect();
        let after: HashSet<&str> = new.remote_ids().collect();
        Self {
            added: new
                .remote_ids()
                .filter(|id| !before.contains(id))
                .map(str::to_string)
                .collect(),
            removed: original
                .remote_ids()
                .filter(|id| !after.contains(id))
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Two canonicalized documents ready to be compared.
#[derive(Debug, Clone)]
pub struct JsonDiff {
    pub original_label: String,
    pub new_label: String,
    original: String,
    new: String,
    /// Present when both documents are Tasks.org backups.
    pub task_ids: Option<TaskIdChanges>,
}

impl JsonDiff {
    pub fn new(
        original_label: impl Into<String>,
        original: &[u8],
        new_label: impl Into<String>,
        new: &[u8],
    ) -> ConvertResult<Self> {
        let canonical_original = canonicalize(original, "original document")?;
        let canonical_new = canonicalize(new, "new document")?;

        let task_ids = match (TasksOrgBackup::parse(original), TasksOrgBackup::parse(new)) {
            (Ok(a), Ok(b)) => Some(TaskIdChanges::between(&a, &b)),
            _ => None,
        };

        Ok(Self {
            original_label: original_label.into(),
            new_label: new_label.into(),
            original: canonical_original,
            new: canonical_new,
            task_ids,
        })
    }

    pub fn summary(&self) -> DiffSummary {
        let diff = TextDiff::from_lines(&self.original, &self.new);
        let mut summary = DiffSummary::default();
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => summary.inserted += 1,
                ChangeTag::Delete => summary.deleted += 1,
                ChangeTag::Equal => summary.unchanged += 1,
            }
        }
        summary
    }

    /// The whole document with changed lines marked `-` / `+`.
    pub fn render_full(&self, color: bool) -> String {
        let diff = TextDiff::from_lines(&self.original, &self.new);
        let mut out = String::new();
        for change in diff.iter_all_changes() {
            let line = change.value().trim_end_matches('\n');
            let _ = match change.tag() {
                ChangeTag::Equal => writeln!(out, " {line}"),
                ChangeTag::Delete if color => writeln!(out, "{}", format!("-{line}").red()),
                ChangeTag::Delete => writeln!(out, "-{line}"),
                ChangeTag::Insert if color => writeln!(out, "{}", format!("+{line}").green()),
                ChangeTag::Insert => writeln!(out, "+{line}"),
            };
        }
        out
    }

    /// Unified diff with `context` lines around each change.
    pub fn render_unified(&self, context: usize) -> String {
        TextDiff::from_lines(&self.original, &self.new)
            .unified_diff()
            .context_radius(context)
            .header(&self.original_label, &self.new_label)
            .to_string()
    }

    /// Short report: line counts plus task IDs when available.
    pub fn render_summary(&self) -> String {
        let summary = self.summary();
        let mut out = String::new();
        let _ = writeln!(out, "Diff: {} -> {}", self.original_label, self.new_label);
        if summary.is_identical() {
            let _ = writeln!(out, "No differences found.");
        } else {
            let _ = writeln!(
                out,
                "  lines: +{} -{} ={}",
                summary.inserted, summary.deleted, summary.unchanged
            );
        }
        if let Some(ids) = &self.task_ids
            && !ids.is_empty()
        {
            let _ = writeln!(out, "  tasks: +{} -{}", ids.added.len(), ids.removed.len());
            for id in &ids.added {
                let _ = writeln!(out, "    + {id}");
            }
            for id in &ids.removed {
                let _ = writeln!(out, "    - {id}");
            }
        }
        out
    }
}
