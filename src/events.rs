//! Diagnostic events emitted by the conversion core.
//!
//! The core never logs on its own. It reports what happened to an
//! [`EventSink`] handed in by the caller:
//! - [`TracingSink`] forwards events to `tracing` (used by the binary)
//! - [`MemorySink`] records them (used by tests)

use crate::transform::Resolution;
use chrono::{DateTime, Utc};
use std::cell::RefCell;

/// Something worth reporting during a conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionEvent {
    /// The Google Tasks export was parsed.
    SourceRead { tasks: usize },
    /// The Tasks.org backup was parsed.
    TargetRead { calendars: usize, tasks: usize },
    /// A task due at exactly 22:00:00Z was interpreted one way or the other.
    AmbiguityResolved {
        remote_id: String,
        title: String,
        due: DateTime<Utc>,
        resolution: Resolution,
        /// Whether the operator chose, rather than the configured handling.
        interactive: bool,
    },
    /// A converted task was already present and was not added again.
    DuplicateSkipped { remote_id: String, title: String },
    /// A converted task was appended to the backup.
    TaskAdded { remote_id: String, title: String },
    /// All converted tasks have been merged.
    MergeFinished { added: usize, skipped: usize },
}

/// Severity of an event, ordered from least to most important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    Debug,
    Info,
    Warning,
}

impl ConversionEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            ConversionEvent::TaskAdded { .. } => EventLevel::Debug,
            ConversionEvent::DuplicateSkipped { .. } => EventLevel::Warning,
            _ => EventLevel::Info,
        }
    }
}

/// Receiver of conversion events.
pub trait EventSink {
    fn emit(&self, event: ConversionEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ConversionEvent) {}
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Clone)]
pub struct TracingSink {
    /// Minimum level to forward.
    min_level: EventLevel,
}

impl TracingSink {
    pub fn new() -> Self {
        Self {
            min_level: EventLevel::Debug,
        }
    }

    pub fn with_min_level(mut self, level: EventLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn should_emit(&self, level: EventLevel) -> bool {
        level >= self.min_level
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for TracingSink {
    fn emit(&self, event: ConversionEvent) {
        if !self.should_emit(event.level()) {
            return;
        }

        match event {
            ConversionEvent::SourceRead { tasks } => {
                tracing::info!(count = tasks, "Read Google Tasks.");
            }
            ConversionEvent::TargetRead { calendars, tasks } => {
                tracing::info!(calendars, tasks, "Read Tasks.org backup.");
            }
            ConversionEvent::AmbiguityResolved {
                remote_id,
                title,
                due,
                resolution,
                interactive,
            } => {
                tracing::info!(
                    remote_id = %remote_id,
                    title = %title,
                    due = %due.to_rfc3339(),
                    used_handling = %resolution,
                    interactive,
                    "Resolved ambiguous task."
                );
            }
            ConversionEvent::DuplicateSkipped { remote_id, title } => {
                tracing::warn!(
                    remote_id = %remote_id,
                    title = %title,
                    "Transformed task already exists in Tasks.org backup. Skipping."
                );
            }
            ConversionEvent::TaskAdded { remote_id, title } => {
                tracing::debug!(remote_id = %remote_id, title = %title, "Added task.");
            }
            ConversionEvent::MergeFinished { added, skipped } => {
                tracing::info!(added_tasks = added, skipped_tasks = skipped, "Merged tasks.");
            }
        }
    }
}

/// Records events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RefCell<Vec<ConversionEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ConversionEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&ConversionEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: ConversionEvent) {
        self.events.borrow_mut().push(event);
    }
}
