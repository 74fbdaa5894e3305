//! The conversion pipeline on in-memory documents.
//!
//! export bytes -> [`GoogleTasksExport`] -> [`Transformer`] per task ->
//! [`Merger`] -> [`TasksOrgBackup`] bytes

use crate::error::ConvertResult;
use crate::events::{ConversionEvent, EventSink};
use crate::google_tasks::GoogleTasksExport;
use crate::merge::{MergeReport, Merger, validate_calendar};
use crate::tasks_org::TasksOrgBackup;
use crate::transform::{DueTimeHandling, DueTimeResolver, Transformer};

/// Settings for a conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Calendar new tasks are bound to.
    pub calendar_uuid: String,
    pub due_time_handling: DueTimeHandling,
    /// Indent the output.
    pub pretty: bool,
}

impl ConvertOptions {
    pub fn new(calendar_uuid: impl Into<String>) -> Self {
        Self {
            calendar_uuid: calendar_uuid.into(),
            due_time_handling: DueTimeHandling::default(),
            pretty: false,
        }
    }

    pub fn with_due_time_handling(mut self, handling: DueTimeHandling) -> Self {
        self.due_time_handling = handling;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Result of a conversion run: the complete output document and what was merged.
#[derive(Debug, Clone)]
pub struct ConvertOutput {
    pub bytes: Vec<u8>,
    pub report: MergeReport,
}

/// Convert a Google Tasks export and merge it into a Tasks.org backup.
///
/// Both documents and the calendar are validated before the first task is
/// converted, so a bad input never leads to a prompt. Tasks already present
/// in the backup are skipped before conversion and never prompted for.
pub fn convert(
    export: &[u8],
    backup: &[u8],
    options: &ConvertOptions,
    resolver: &mut dyn DueTimeResolver,
    sink: &dyn EventSink,
) -> ConvertResult<ConvertOutput> {
    let export = GoogleTasksExport::parse(export)?;
    sink.emit(ConversionEvent::SourceRead {
        tasks: export.len(),
    });

    let mut doc = TasksOrgBackup::parse(backup)?;
    sink.emit(ConversionEvent::TargetRead {
        calendars: doc.calendars.len(),
        tasks: doc.tasks.len(),
    });
    validate_calendar(&doc, &options.calendar_uuid)?;

    let report = merge_export(&export, &mut doc, options, resolver, sink)?;

    let bytes = if options.pretty {
        doc.to_vec_pretty()?
    } else {
        doc.to_vec()?
    };
    Ok(ConvertOutput { bytes, report })
}

/// Convert every task of `export` and append the new ones to `doc`.
pub fn merge_export(
    export: &GoogleTasksExport,
    doc: &mut TasksOrgBackup,
    options: &ConvertOptions,
    resolver: &mut dyn DueTimeResolver,
    sink: &dyn EventSink,
) -> ConvertResult<MergeReport> {
    let mut merger = Merger::new(doc, &options.calendar_uuid, sink)?;
    let mut transformer = Transformer::new(options.due_time_handling, resolver, sink);

    for item in &export.items {
        if merger.contains(&item.id) {
            merger.skip(&item.id, item.title.trim());
            continue;
        }
        merger.push(transformer.transform(item)?);
    }

    Ok(merger.finish())
}
