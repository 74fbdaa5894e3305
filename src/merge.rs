//! Appending converted tasks to a Tasks.org backup without duplicates.
//!
//! Tasks are identified by `task.remoteId`. A task whose ID is already in the
//! backup, or was already appended earlier in the same run, is skipped. Running
//! the conversion again on its own output therefore adds nothing.

use crate::error::{ConvertError, ConvertResult};
use crate::events::{ConversionEvent, EventSink};
use crate::tasks_org::{
    Alarm, CaldavCalendar, CaldavTask, DEFAULT_ALARM_TYPE, TaskEntry, TaskItem, TaskRecord,
    TasksOrgBackup,
};
use std::collections::HashSet;
use uuid::Uuid;

/// Outcome of a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub skipped: usize,
}

/// Look up the calendar new tasks are bound to.
pub fn validate_calendar<'a>(
    doc: &'a TasksOrgBackup,
    calendar_uuid: &str,
) -> ConvertResult<&'a CaldavCalendar> {
    doc.calendar(calendar_uuid)
        .ok_or_else(|| ConvertError::unknown_calendar(calendar_uuid))
}

/// Appends converted tasks to a backup.
pub struct Merger<'a> {
    doc: &'a mut TasksOrgBackup,
    calendar_uuid: String,
    known: HashSet<String>,
    report: MergeReport,
    sink: &'a dyn EventSink,
}

impl<'a> Merger<'a> {
    /// Index the backup's tasks. Fails without touching the backup if the
    /// calendar is not registered in it.
    pub fn new(
        doc: &'a mut TasksOrgBackup,
        calendar_uuid: &str,
        sink: &'a dyn EventSink,
    ) -> ConvertResult<Self> {
        validate_calendar(doc, calendar_uuid)?;
        let known = doc.remote_ids().map(str::to_string).collect();
        Ok(Self {
            doc,
            calendar_uuid: calendar_uuid.to_string(),
            known,
            report: MergeReport::default(),
            sink,
        })
    }

    /// Whether a task with this remote ID is in the backup or already appended.
    pub fn contains(&self, remote_id: &str) -> bool {
        self.known.contains(remote_id)
    }

    /// Count a known task as skipped without converting it first.
    pub fn skip(&mut self, remote_id: &str, title: &str) {
        self.sink.emit(ConversionEvent::DuplicateSkipped {
            remote_id: remote_id.to_string(),
            title: title.to_string(),
        });
        self.report.skipped += 1;
    }

    /// Append a single task unless its remote ID is already known.
    /// Returns whether the task was added.
    pub fn push(&mut self, task: TaskRecord) -> bool {
        if self.contains(&task.remote_id) {
            self.skip(&task.remote_id, &task.title);
            return false;
        }

        self.known.insert(task.remote_id.clone());
        self.sink.emit(ConversionEvent::TaskAdded {
            remote_id: task.remote_id.clone(),
            title: task.title.clone(),
        });

        let mut item = TaskItem::new(task);
        item.alarms.push(Alarm {
            kind: DEFAULT_ALARM_TYPE,
        });
        item.caldav_tasks.push(CaldavTask {
            calendar: self.calendar_uuid.clone(),
            remote_id: Uuid::new_v4().to_string(),
        });
        self.doc.tasks.push(TaskEntry::Converted(item));
        self.report.added += 1;
        true
    }

    pub fn finish(self) -> MergeReport {
        self.sink.emit(ConversionEvent::MergeFinished {
            added: self.report.added,
            skipped: self.report.skipped,
        });
        self.report
    }
}

/// Merge a batch of converted tasks into `doc`.
pub fn merge_tasks(
    doc: &mut TasksOrgBackup,
    tasks: impl IntoIterator<Item = TaskRecord>,
    calendar_uuid: &str,
    sink: &dyn EventSink,
) -> ConvertResult<MergeReport> {
    let mut merger = Merger::new(doc, calendar_uuid, sink)?;
    for task in tasks {
        merger.push(task);
    }
    Ok(merger.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MemorySink, NullSink};
    use serde_json::json;

    fn doc(tasks: serde_json::Value) -> TasksOrgBackup {
        let bytes = serde_json::to_vec(&json!({
            "version": 1,
            "data": {
                "caldavCalendars": [{ "uuid": "cal-1", "account": "a", "name": "Inbox" }],
                "tasks": tasks
            }
        }))
        .unwrap();
        TasksOrgBackup::parse(&bytes).unwrap()
    }

    fn record(id: &str) -> TaskRecord {
        TaskRecord {
            remote_id: id.to_string(),
            priority: 2,
            title: format!("Task {id}"),
            notes: None,
            creation_date: 0,
            modification_date: 0,
            completion_date: None,
            due_date: 1000,
        }
    }

    #[test]
    fn test_appends_in_order_with_binding() {
        let mut doc = doc(json!([{ "task": { "remoteId": "old" } }]));
        let report =
            merge_tasks(&mut doc, vec![record("a"), record("b")], "cal-1", &NullSink).unwrap();

        assert_eq!(report, MergeReport { added: 2, skipped: 0 });
        assert_eq!(
            doc.remote_ids().collect::<Vec<_>>(),
            vec!["old", "a", "b"]
        );

        let added: Vec<&TaskItem> = doc.converted().collect();
        for item in &added {
            assert_eq!(item.alarms, vec![Alarm { kind: 2 }]);
            assert_eq!(item.caldav_tasks.len(), 1);
            assert_eq!(item.caldav_tasks[0].calendar, "cal-1");
        }
        assert_ne!(
            added[0].caldav_tasks[0].remote_id,
            added[1].caldav_tasks[0].remote_id
        );
    }

    #[test]
    fn test_skips_existing_and_in_run_duplicates() {
        let mut doc = doc(json!([{ "task": { "remoteId": "a" } }]));
        let sink = MemorySink::new();
        let report = merge_tasks(
            &mut doc,
            vec![record("a"), record("b"), record("b")],
            "cal-1",
            &sink,
        )
        .unwrap();

        assert_eq!(report, MergeReport { added: 1, skipped: 2 });
        assert_eq!(doc.tasks.len(), 2);
        assert_eq!(
            sink.count(|e| matches!(e, ConversionEvent::DuplicateSkipped { .. })),
            2
        );
        assert!(sink.events().contains(&ConversionEvent::DuplicateSkipped {
            remote_id: "a".to_string(),
            title: "Task a".to_string(),
        }));
        assert_eq!(
            sink.events().last(),
            Some(&ConversionEvent::MergeFinished {
                added: 1,
                skipped: 2
            })
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut doc = doc(json!([]));
        let batch = vec![record("a"), record("b")];
        let first = merge_tasks(&mut doc, batch.clone(), "cal-1", &NullSink).unwrap();
        assert_eq!(first.added, 2);

        let mut reparsed = TasksOrgBackup::parse(&doc.to_vec().unwrap()).unwrap();
        let second = merge_tasks(&mut reparsed, batch, "cal-1", &NullSink).unwrap();
        assert_eq!(second, MergeReport { added: 0, skipped: 2 });
        assert_eq!(reparsed.tasks.len(), 2);
    }

    #[test]
    fn test_unknown_calendar_fails_without_mutation() {
        let mut doc = doc(json!([{ "task": { "remoteId": "old" } }]));
        let before = doc.to_vec().unwrap();
        let err = merge_tasks(&mut doc, vec![record("a")], "cal-2", &NullSink).unwrap_err();

        assert!(err.is_format_error());
        assert!(matches!(err, ConvertError::UnknownCalendar { .. }));
        assert_eq!(doc.to_vec().unwrap(), before);
    }
}
