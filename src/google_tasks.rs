//! Google Tasks Takeout export.
//!
//! The export wraps the task list in two layers:
//!
//! ```json
//! { "kind": "tasks#taskLists", "items": [ { "items": [ <task>, ... ] } ] }
//! ```
//!
//! Only exports holding exactly one task list are supported. The format is
//! read-only here: nothing is ever written back in this schema.

use crate::error::{ConvertError, ConvertResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Value of `$.kind` for a Takeout task list export.
pub const EXPORT_KIND: &str = "tasks#taskLists";

const WHAT: &str = "Google Tasks export";

/// A single task from the export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GoogleTask {
    pub id: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: Option<DateTime<Utc>>,
}

impl GoogleTask {
    /// Completion instant, or `None` if the task is still open.
    ///
    /// A zero timestamp (`0001-01-01T00:00:00Z` or the Unix epoch) counts as
    /// not completed.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed.filter(|c| !is_zero_time(c))
    }
}

/// Seconds from the Unix epoch to `0001-01-01T00:00:00Z`.
const YEAR_ONE: i64 = -62_135_596_800;

fn is_zero_time(t: &DateTime<Utc>) -> bool {
    matches!(t.timestamp(), 0 | YEAR_ONE)
}

#[derive(Debug, Deserialize)]
struct RawExport {
    kind: Option<String>,
    #[serde(default)]
    items: Vec<RawTaskList>,
}

#[derive(Debug, Deserialize)]
struct RawTaskList {
    #[serde(default)]
    items: Vec<GoogleTask>,
}

/// Parsed export: the tasks of its single task list, in export order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoogleTasksExport {
    pub items: Vec<GoogleTask>,
}

impl GoogleTasksExport {
    /// Parse an export from raw JSON bytes.
    pub fn parse(bytes: &[u8]) -> ConvertResult<Self> {
        let raw: RawExport = serde_json::from_slice(bytes)
            .map_err(|e| ConvertError::format(WHAT, format!("unmarshal root: {e}")))?;

        // Simple sanity check, so another format breaks the program.
        match raw.kind.as_deref() {
            Some(EXPORT_KIND) => {}
            other => {
                return Err(ConvertError::format(
                    WHAT,
                    format!("unknown kind {other:?}, want {EXPORT_KIND:?}"),
                ));
            }
        }

        let mut lists = raw.items;
        if lists.len() != 1 {
            return Err(ConvertError::format(
                WHAT,
                format!(
                    "want exactly 1 task list inside $.items[], got {}",
                    lists.len()
                ),
            ));
        }
        let list = lists.remove(0);

        Ok(Self { items: list.items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn export(lists: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&json!({ "kind": EXPORT_KIND, "items": lists })).unwrap()
    }

    fn task(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "kind": "tasks#task",
            "title": "Title",
            "status": "needsAction",
            "created": "2024-01-01T00:00:00Z",
            "updated": "2024-01-01T00:00:00Z",
            "due": "2024-01-02T22:00:00Z"
        })
    }

    #[test]
    fn test_parse_single_list() {
        let bytes = export(json!([{ "items": [task("a"), task("b")] }]));
        let parsed = GoogleTasksExport::parse(&bytes).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.items[0].id, "a");
        assert_eq!(parsed.items[1].id, "b");
        assert_eq!(parsed.items[0].notes, None);
        assert_eq!(parsed.items[0].completed_at(), None);
    }

    #[test]
    fn test_rejects_wrong_kind() {
        let bytes = serde_json::to_vec(&json!({
            "kind": "tasks#task",
            "items": [{ "items": [] }]
        }))
        .unwrap();
        let err = GoogleTasksExport::parse(&bytes).unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("unknown kind"));
    }

    #[test]
    fn test_rejects_missing_kind() {
        let bytes = serde_json::to_vec(&json!({ "items": [{ "items": [] }] })).unwrap();
        assert!(GoogleTasksExport::parse(&bytes).is_err());
    }

    #[test]
    fn test_rejects_zero_or_many_lists() {
        let none = export(json!([]));
        let err = GoogleTasksExport::parse(&none).unwrap_err();
        assert!(err.to_string().contains("got 0"));

        let two = export(json!([{ "items": [task("a")] }, { "items": [task("b")] }]));
        let err = GoogleTasksExport::parse(&two).unwrap_err();
        assert!(err.to_string().contains("got 2"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(GoogleTasksExport::parse(b"{ not json").is_err());
    }

    #[test]
    fn test_zero_completion_is_not_completed() {
        let mut t = task("a");
        t["completed"] = json!("0001-01-01T00:00:00Z");
        let bytes = export(json!([{ "items": [t] }]));
        let parsed = GoogleTasksExport::parse(&bytes).unwrap();
        assert_eq!(parsed.items[0].completed_at(), None);

        let mut t = task("b");
        t["completed"] = json!("2024-01-03T10:00:00Z");
        let bytes = export(json!([{ "items": [t] }]));
        let parsed = GoogleTasksExport::parse(&bytes).unwrap();
        assert!(parsed.items[0].completed_at().is_some());
    }
}
