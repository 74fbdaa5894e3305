//! Tasks.org backup document.
//!
//! Only two parts of a backup are interpreted: the calendar registry at
//! `$.data.caldavCalendars` and the task list at `$.data.tasks`. Everything
//! else is kept as raw JSON and written back untouched, so a backup survives
//! parse -> merge -> serialize without losing fields this crate does not know
//! about. Pre-existing tasks are raw too: only their `task.remoteId` is read
//! for duplicate detection.

use crate::error::{ConvertError, ConvertResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::{RawValue, to_raw_value};

const WHAT: &str = "Tasks.org backup";

/// Key order preserving map of untouched fields.
pub type Residual = IndexMap<String, Box<RawValue>>;

/// Alarm type attached to converted tasks. The only value observed in real
/// backups for tasks created by the app.
pub const DEFAULT_ALARM_TYPE: i32 = 2;

/// A CalDAV calendar entry from `$.data.caldavCalendars[*]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaldavCalendar {
    pub uuid: String,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub name: String,
}

/// The `task` object of a converted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Identity used for duplicate detection. For converted tasks this is the
    /// Google task ID, so a later run recognizes what it already imported.
    pub remote_id: String,
    pub priority: i32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Unix epoch milliseconds.
    pub creation_date: i64,
    /// Unix epoch milliseconds.
    pub modification_date: i64,
    /// Unix epoch milliseconds, absent when the task is open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<i64>,
    /// Unix epoch milliseconds. Tasks with a due time carry an extra 1000 ms,
    /// see [`crate::transform::DUE_TIME_MARKER_MS`].
    pub due_date: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    #[serde(rename = "type")]
    pub kind: i32,
}

/// Binds a task to a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaldavTask {
    /// Must match one of `$.data.caldavCalendars[*].uuid`.
    pub calendar: String,
    /// Content does not matter, it only has to be unique.
    pub remote_id: String,
}

/// A full task wrapper as it appears in `$.data.tasks[*]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    pub task: TaskRecord,
    pub alarms: Vec<Alarm>,
    pub caldav_tasks: Vec<CaldavTask>,
    pub geofences: Vec<serde_json::Value>,
    pub tags: Vec<serde_json::Value>,
    pub comments: Vec<serde_json::Value>,
    pub attachments: Vec<serde_json::Value>,
}

impl TaskItem {
    /// Wrap a converted task with no alarms, bindings or extensions yet.
    pub fn new(task: TaskRecord) -> Self {
        Self {
            task,
            alarms: Vec::new(),
            caldav_tasks: Vec::new(),
            geofences: Vec::new(),
            tags: Vec::new(),
            comments: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

/// An entry of the task list.
#[derive(Debug, Clone)]
pub enum TaskEntry {
    /// Read from the backup; re-emitted byte for byte.
    Existing {
        remote_id: Option<String>,
        raw: Box<RawValue>,
    },
    /// Appended by this run.
    Converted(TaskItem),
}

impl TaskEntry {
    pub fn remote_id(&self) -> Option<&str> {
        match self {
            TaskEntry::Existing { remote_id, .. } => remote_id.as_deref(),
            TaskEntry::Converted(item) => Some(&item.task.remote_id),
        }
    }

    fn from_raw(raw: Box<RawValue>) -> ConvertResult<Self> {
        #[derive(Deserialize)]
        struct Identity {
            task: Option<IdentityTask>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct IdentityTask {
            remote_id: Option<String>,
        }

        let identity: Identity = serde_json::from_str(raw.get())
            .map_err(|e| ConvertError::format(WHAT, format!("unmarshal task: {e}")))?;
        Ok(TaskEntry::Existing {
            remote_id: identity.task.and_then(|t| t.remote_id),
            raw,
        })
    }
}

impl Serialize for TaskEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TaskEntry::Existing { raw, .. } => raw.serialize(serializer),
            TaskEntry::Converted(item) => item.serialize(serializer),
        }
    }
}

/// A parsed Tasks.org backup.
#[derive(Debug, Clone)]
pub struct TasksOrgBackup {
    /// Root fields except `data`.
    root: Residual,
    /// Position of `data` among the root fields.
    data_index: usize,
    /// `data` fields except `tasks`. `caldavCalendars` stays in here raw.
    data: Residual,
    /// Position of `tasks` among the `data` fields.
    tasks_index: usize,
    /// `tasks` was `null`; written back as `null` while still empty.
    tasks_null: bool,
    pub calendars: Vec<CaldavCalendar>,
    pub tasks: Vec<TaskEntry>,
}

impl TasksOrgBackup {
    /// Parse a backup from raw JSON bytes.
    pub fn parse(bytes: &[u8]) -> ConvertResult<Self> {
        let mut root: Residual = serde_json::from_slice(bytes)
            .map_err(|e| ConvertError::format(WHAT, format!("unmarshal root: {e}")))?;

        let (data_index, _, raw_data) = root
            .shift_remove_full("data")
            .ok_or_else(|| ConvertError::format(WHAT, "missing $.data"))?;
        let mut data: Residual = serde_json::from_str(raw_data.get())
            .map_err(|e| ConvertError::format(WHAT, format!("unmarshal data: {e}")))?;

        let raw_calendars = data
            .get("caldavCalendars")
            .ok_or_else(|| ConvertError::format(WHAT, "missing $.data.caldavCalendars"))?;
        // null counts as an empty list, a missing key does not
        let calendars = serde_json::from_str::<Option<Vec<CaldavCalendar>>>(raw_calendars.get())
            .map_err(|e| ConvertError::format(WHAT, format!("unmarshal caldav calendars: {e}")))?
            .unwrap_or_default();

        // Removed because the tasks are modified and marshaled again later on.
        let (tasks_index, _, raw_tasks) = data
            .shift_remove_full("tasks")
            .ok_or_else(|| ConvertError::format(WHAT, "missing $.data.tasks"))?;
        let raw_tasks: Option<Vec<Box<RawValue>>> = serde_json::from_str(raw_tasks.get())
            .map_err(|e| ConvertError::format(WHAT, format!("unmarshal tasks: {e}")))?;
        let tasks_null = raw_tasks.is_none();
        let raw_tasks = raw_tasks.unwrap_or_default();
        let tasks = raw_tasks
            .into_iter()
            .map(TaskEntry::from_raw)
            .collect::<ConvertResult<Vec<_>>>()?;

        Ok(Self {
            root,
            data_index,
            data,
            tasks_index,
            tasks_null,
            calendars,
            tasks,
        })
    }

    /// Reassemble the document with the current task list.
    pub fn to_vec(&self) -> ConvertResult<Vec<u8>> {
        serde_json::to_vec(&self.assemble()?).map_err(ConvertError::Serialization)
    }

    /// Reassemble the document with two-space indentation throughout.
    pub fn to_vec_pretty(&self) -> ConvertResult<Vec<u8>> {
        // Raw values are emitted verbatim, so go through a Value to indent them too.
        let value: serde_json::Value = serde_json::from_str(self.assemble()?.get())
            .map_err(ConvertError::Serialization)?;
        serde_json::to_vec_pretty(&value).map_err(ConvertError::Serialization)
    }

    fn assemble(&self) -> ConvertResult<Box<RawValue>> {
        let mut data = self.data.clone();
        let tasks = if self.tasks_null && self.tasks.is_empty() {
            to_raw_value(&serde_json::Value::Null)
        } else {
            to_raw_value(&self.tasks)
        }
        .map_err(ConvertError::Serialization)?;
        data.shift_insert(self.tasks_index.min(data.len()), "tasks".to_string(), tasks);

        let mut root = self.root.clone();
        let data = to_raw_value(&data).map_err(ConvertError::Serialization)?;
        root.shift_insert(self.data_index.min(root.len()), "data".to_string(), data);

        to_raw_value(&root).map_err(ConvertError::Serialization)
    }

    pub fn calendar(&self, uuid: &str) -> Option<&CaldavCalendar> {
        self.calendars.iter().find(|c| c.uuid == uuid)
    }

    /// Remote IDs of all tasks that carry one, in document order.
    pub fn remote_ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().filter_map(TaskEntry::remote_id)
    }

    /// Tasks appended during this run.
    pub fn converted(&self) -> impl Iterator<Item = &TaskItem> {
        self.tasks.iter().filter_map(|t| match t {
            TaskEntry::Converted(item) => Some(item),
            TaskEntry::Existing { .. } => None,
        })
    }
}
