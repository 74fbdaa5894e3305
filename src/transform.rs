//! Google task -> Tasks.org task conversion.
//!
//! Google Takeout writes whole day tasks with a due time of 22:00:00Z, which
//! is indistinguishable from a task really due at 22:00Z. [`DueTimeHandling`]
//! decides how such tasks are converted; with [`DueTimeHandling::Ask`] the
//! decision is delegated to a [`DueTimeResolver`] once per task.

use crate::error::{ConvertError, ConvertResult};
use crate::events::{ConversionEvent, EventSink};
use crate::google_tasks::GoogleTask;
use crate::tasks_org::TaskRecord;
use chrono::{DateTime, Timelike, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufRead, Write};

/// Priority of converted tasks. Tasks.org's default ("none").
pub const DEFAULT_PRIORITY: i32 = 2;

/// Added to the due date of tasks that have a due time. Tasks.org uses it to
/// tell "due at a time" apart from "due some time that day".
pub const DUE_TIME_MARKER_MS: i64 = 1000;

/// From 22:00:00Z to 00:00:00Z of the next day.
pub const WHOLE_DAY_SHIFT_MS: i64 = 2 * 60 * 60 * 1000;

/// Hour (UTC) Google Takeout uses for whole day tasks.
pub const AMBIGUOUS_HOUR: u32 = 22;

/// How to convert tasks due at exactly 22:00:00Z.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DueTimeHandling {
    /// Whole day task on the next day
    Day,
    /// Task due at 22:00Z on the same day
    Time,
    /// Ask for every such task
    #[default]
    Ask,
}

impl std::str::FromStr for DueTimeHandling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(DueTimeHandling::Day),
            "time" => Ok(DueTimeHandling::Time),
            "ask" => Ok(DueTimeHandling::Ask),
            _ => Err(format!(
                "invalid value '{}', valid values are: day, time, ask",
                s
            )),
        }
    }
}

impl fmt::Display for DueTimeHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueTimeHandling::Day => write!(f, "day"),
            DueTimeHandling::Time => write!(f, "time"),
            DueTimeHandling::Ask => write!(f, "ask"),
        }
    }
}

/// Final interpretation of an ambiguous due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Day,
    Time,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Day => write!(f, "day"),
            Resolution::Time => write!(f, "time"),
        }
    }
}

/// Where a due date stands before it is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    /// Not due at 22:00:00Z (or not due at all); converted as is.
    Unambiguous,
    /// Due at 22:00:00Z and the handling is `ask`.
    NeedsResolution,
    /// Due at 22:00:00Z and decided.
    Resolved(Resolution),
}

impl DueState {
    pub fn classify(due: Option<DateTime<Utc>>, handling: DueTimeHandling) -> Self {
        match due {
            Some(due) if is_ambiguous(&due) => match handling {
                DueTimeHandling::Day => DueState::Resolved(Resolution::Day),
                DueTimeHandling::Time => DueState::Resolved(Resolution::Time),
                DueTimeHandling::Ask => DueState::NeedsResolution,
            },
            _ => DueState::Unambiguous,
        }
    }
}

/// Whether a due instant carries the whole day marker time 22:00:00Z.
pub fn is_ambiguous(due: &DateTime<Utc>) -> bool {
    due.hour() == AMBIGUOUS_HOUR && due.minute() == 0 && due.second() == 0
}

/// The task shown to the operator when asking.
#[derive(Debug, Clone, Copy)]
pub struct AmbiguousDue<'a> {
    pub remote_id: &'a str,
    pub title: &'a str,
    pub due: DateTime<Utc>,
}

/// Decides ambiguous due dates when the handling is `ask`.
pub trait DueTimeResolver {
    fn resolve(&mut self, task: &AmbiguousDue<'_>) -> ConvertResult<Resolution>;
}

/// Always answers the same.
#[derive(Debug, Clone, Copy)]
pub struct FixedResolver(pub Resolution);

impl DueTimeResolver for FixedResolver {
    fn resolve(&mut self, _task: &AmbiguousDue<'_>) -> ConvertResult<Resolution> {
        Ok(self.0)
    }
}

/// Asks the operator on a terminal-like reader/writer pair.
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn prompt_io(&mut self, task: &AmbiguousDue<'_>) -> std::io::Result<Resolution> {
        writeln!(
            self.output,
            "The following task could be interpreted to have no time."
        )?;
        writeln!(self.output, "  ID:    {}", task.remote_id)?;
        writeln!(self.output, "  Title: {}", task.title)?;
        writeln!(self.output, "  Due:   {}", task.due.to_rfc3339())?;

        loop {
            write!(
                self.output,
                "Convert to next day task with no time (1), or same day task with time (2): "
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "input closed while waiting for a choice",
                ));
            }
            match line.trim() {
                "1" => return Ok(Resolution::Day),
                "2" => return Ok(Resolution::Time),
                _ => {}
            }
        }
    }
}

impl<R: BufRead, W: Write> DueTimeResolver for PromptResolver<R, W> {
    fn resolve(&mut self, task: &AmbiguousDue<'_>) -> ConvertResult<Resolution> {
        self.prompt_io(task)
            .map_err(|e| ConvertError::io("<stdin>", e))
    }
}

/// Converts Google tasks one at a time.
pub struct Transformer<'a> {
    handling: DueTimeHandling,
    resolver: &'a mut dyn DueTimeResolver,
    sink: &'a dyn EventSink,
}

impl<'a> Transformer<'a> {
    pub fn new(
        handling: DueTimeHandling,
        resolver: &'a mut dyn DueTimeResolver,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            handling,
            resolver,
            sink,
        }
    }

    /// Convert a single task. Only fails when asking the operator fails.
    pub fn transform(&mut self, item: &GoogleTask) -> ConvertResult<TaskRecord> {
        let mut record = TaskRecord {
            remote_id: item.id.clone(),
            priority: DEFAULT_PRIORITY,
            title: item.title.trim().to_string(),
            notes: item
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            creation_date: item.created.timestamp_millis(),
            modification_date: item.updated.timestamp_millis(),
            completion_date: item.completed_at().map(|c| c.timestamp_millis()),
            due_date: item
                .due
                .map(|d| d.timestamp_millis() + DUE_TIME_MARKER_MS)
                .unwrap_or(0),
        };

        let Some(due) = item.due else {
            return Ok(record);
        };
        let (resolution, interactive) = match DueState::classify(Some(due), self.handling) {
            DueState::Unambiguous => return Ok(record),
            DueState::Resolved(resolution) => (resolution, false),
            DueState::NeedsResolution => {
                let ambiguous = AmbiguousDue {
                    remote_id: &record.remote_id,
                    title: &record.title,
                    due,
                };
                (self.resolver.resolve(&ambiguous)?, true)
            }
        };

        if resolution == Resolution::Day {
            // Drop the due time marker and move on to 00:00Z of the next day.
            record.due_date += WHOLE_DAY_SHIFT_MS - DUE_TIME_MARKER_MS;
        }

        self.sink.emit(ConversionEvent::AmbiguityResolved {
            remote_id: record.remote_id.clone(),
            title: record.title.clone(),
            due,
            resolution,
            interactive,
        });

        Ok(record)
    }
}

/// Convert a single task with a fixed handling, `ask` deferring to `resolver`.
pub fn transform_task(
    item: &GoogleTask,
    handling: DueTimeHandling,
    resolver: &mut dyn DueTimeResolver,
    sink: &dyn EventSink,
) -> ConvertResult<TaskRecord> {
    Transformer::new(handling, resolver, sink).transform(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MemorySink, NullSink};
    use std::io::Cursor;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn task(due: &str) -> GoogleTask {
        GoogleTask {
            id: "abc".to_string(),
            kind: "tasks#task".to_string(),
            title: " Buy milk ".to_string(),
            status: "needsAction".to_string(),
            notes: Some("  two liters \n".to_string()),
            created: ts("2024-01-01T00:00:00Z"),
            updated: ts("2024-01-01T12:00:00Z"),
            due: Some(ts(due)),
            completed: None,
        }
    }

    /// Panics when asked; for paths that must never prompt.
    struct NeverAsk;

    impl DueTimeResolver for NeverAsk {
        fn resolve(&mut self, task: &AmbiguousDue<'_>) -> ConvertResult<Resolution> {
            panic!("unexpected prompt for {}", task.remote_id)
        }
    }

    #[test]
    fn test_field_mapping() {
        let item = task("2024-01-05T09:30:00Z");
        let record = transform_task(&item, DueTimeHandling::Ask, &mut NeverAsk, &NullSink).unwrap();

        assert_eq!(record.remote_id, "abc");
        assert_eq!(record.priority, DEFAULT_PRIORITY);
        assert_eq!(record.title, "Buy milk");
        assert_eq!(record.notes.as_deref(), Some("two liters"));
        assert_eq!(record.creation_date, item.created.timestamp_millis());
        assert_eq!(record.modification_date, item.updated.timestamp_millis());
        assert_eq!(record.completion_date, None);
        assert_eq!(
            record.due_date,
            ts("2024-01-05T09:30:00Z").timestamp_millis() + 1000
        );
    }

    #[test]
    fn test_blank_notes_are_dropped() {
        let mut item = task("2024-01-05T09:30:00Z");
        item.notes = Some("   ".to_string());
        let record = transform_task(&item, DueTimeHandling::Day, &mut NeverAsk, &NullSink).unwrap();
        assert_eq!(record.notes, None);
    }

    #[test]
    fn test_completion_date() {
        let mut item = task("2024-01-05T09:30:00Z");
        item.completed = Some(ts("2024-01-06T08:00:00Z"));
        let record = transform_task(&item, DueTimeHandling::Day, &mut NeverAsk, &NullSink).unwrap();
        assert_eq!(
            record.completion_date,
            Some(ts("2024-01-06T08:00:00Z").timestamp_millis())
        );

        item.completed = Some(ts("0001-01-01T00:00:00Z"));
        let record = transform_task(&item, DueTimeHandling::Day, &mut NeverAsk, &NullSink).unwrap();
        assert_eq!(record.completion_date, None);
    }

    #[test]
    fn test_missing_due_date() {
        let mut item = task("2024-01-05T09:30:00Z");
        item.due = None;
        let record = transform_task(&item, DueTimeHandling::Ask, &mut NeverAsk, &NullSink).unwrap();
        assert_eq!(record.due_date, 0);
    }

    #[test]
    fn test_day_handling() {
        let item = task("2024-01-02T22:00:00Z");
        let sink = MemorySink::new();
        let record = transform_task(&item, DueTimeHandling::Day, &mut NeverAsk, &sink).unwrap();

        let due = ts("2024-01-02T22:00:00Z").timestamp_millis();
        assert_eq!(record.due_date, due + 2 * 60 * 60 * 1000);
        assert_eq!(record.due_date, ts("2024-01-03T00:00:00Z").timestamp_millis());

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ConversionEvent::AmbiguityResolved {
                resolution: Resolution::Day,
                interactive: false,
                ..
            }
        ));
    }

    #[test]
    fn test_time_handling() {
        let item = task("2024-01-02T22:00:00Z");
        let record = transform_task(&item, DueTimeHandling::Time, &mut NeverAsk, &NullSink).unwrap();
        assert_eq!(
            record.due_date,
            ts("2024-01-02T22:00:00Z").timestamp_millis() + 1000
        );
    }

    #[test]
    fn test_handling_irrelevant_for_unambiguous_times() {
        for due in [
            "2024-01-02T21:59:59Z",
            "2024-01-02T22:00:01Z",
            "2024-01-02T22:01:00Z",
            "2024-01-02T00:00:00Z",
            "2024-01-02T10:00:00Z",
        ] {
            let item = task(due);
            let sink = MemorySink::new();
            let results: Vec<i64> = [DueTimeHandling::Day, DueTimeHandling::Time, DueTimeHandling::Ask]
                .into_iter()
                .map(|h| transform_task(&item, h, &mut NeverAsk, &sink).unwrap().due_date)
                .collect();
            assert!(results.iter().all(|d| *d == results[0]), "{due}");
            assert!(sink.events().is_empty(), "{due}");
        }
    }

    #[test]
    fn test_ask_uses_resolver() {
        let item = task("2024-01-02T22:00:00Z");
        let sink = MemorySink::new();
        let mut resolver = FixedResolver(Resolution::Day);
        let record = transform_task(&item, DueTimeHandling::Ask, &mut resolver, &sink).unwrap();
        assert_eq!(record.due_date, ts("2024-01-03T00:00:00Z").timestamp_millis());
        assert!(matches!(
            &sink.events()[0],
            ConversionEvent::AmbiguityResolved {
                interactive: true,
                ..
            }
        ));
    }

    #[test]
    fn test_prompt_reprompts_until_valid() {
        let input = Cursor::new("x\n\n3\n 2 \n");
        let mut output = Vec::new();
        let mut resolver = PromptResolver::new(input, &mut output);
        let item = task("2024-01-02T22:00:00Z");
        let record = transform_task(&item, DueTimeHandling::Ask, &mut resolver, &NullSink).unwrap();
        assert_eq!(
            record.due_date,
            ts("2024-01-02T22:00:00Z").timestamp_millis() + 1000
        );

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("ID:    abc"));
        assert!(text.contains("Title: Buy milk"));
        assert_eq!(text.matches("(1), or same day task with time (2)").count(), 4);
    }

    #[test]
    fn test_prompt_day_choice() {
        let mut resolver = PromptResolver::new(Cursor::new("1\n"), std::io::sink());
        let due = AmbiguousDue {
            remote_id: "a",
            title: "A",
            due: ts("2024-01-02T22:00:00Z"),
        };
        assert_eq!(resolver.resolve(&due).unwrap(), Resolution::Day);
    }

    #[test]
    fn test_prompt_eof_fails() {
        let mut resolver = PromptResolver::new(Cursor::new("nope\n"), std::io::sink());
        let due = AmbiguousDue {
            remote_id: "a",
            title: "A",
            due: ts("2024-01-02T22:00:00Z"),
        };
        let err = resolver.resolve(&due).unwrap_err();
        assert!(!err.is_format_error());
    }

    #[test]
    fn test_due_time_handling_parse() {
        assert_eq!("day".parse::<DueTimeHandling>().unwrap(), DueTimeHandling::Day);
        assert_eq!("TIME".parse::<DueTimeHandling>().unwrap(), DueTimeHandling::Time);
        assert_eq!("ask".parse::<DueTimeHandling>().unwrap(), DueTimeHandling::Ask);
        assert!("never".parse::<DueTimeHandling>().is_err());
        assert_eq!(DueTimeHandling::default(), DueTimeHandling::Ask);
        assert_eq!(DueTimeHandling::Time.to_string(), "time");
    }

    #[test]
    fn test_classify() {
        let ambiguous = Some(ts("2024-01-02T22:00:00Z"));
        assert_eq!(
            DueState::classify(ambiguous, DueTimeHandling::Ask),
            DueState::NeedsResolution
        );
        assert_eq!(
            DueState::classify(ambiguous, DueTimeHandling::Day),
            DueState::Resolved(Resolution::Day)
        );
        assert_eq!(
            DueState::classify(None, DueTimeHandling::Ask),
            DueState::Unambiguous
        );
    }
}
