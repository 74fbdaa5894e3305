//! Field-by-field merging of configuration tiers.
//!
//! Higher tiers override lower ones. Objects merge recursively, everything
//! else is replaced, and `null` means "not specified".

use serde_json::Value;

/// Merge `overlay` onto `base`, with `overlay` taking precedence.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge tiers in order, later tiers taking precedence.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sections_merge_field_by_field() {
        let base = json!({
            "convert": { "calendar_uuid": "cal-1", "due_time_handling": "ask" },
            "diff": { "context": 3 }
        });
        let overlay = json!({ "convert": { "due_time_handling": "day" } });
        assert_eq!(
            deep_merge(base, overlay),
            json!({
                "convert": { "calendar_uuid": "cal-1", "due_time_handling": "day" },
                "diff": { "context": 3 }
            })
        );
    }

    #[test]
    fn test_null_keeps_lower_tier() {
        let base = json!({ "convert": { "calendar_uuid": "cal-1" } });
        let overlay = json!({ "convert": { "calendar_uuid": null } });
        assert_eq!(
            deep_merge(base, overlay),
            json!({ "convert": { "calendar_uuid": "cal-1" } })
        );
    }

    #[test]
    fn test_scalar_replaces_section() {
        let base = json!({ "logging": { "output": "2" } });
        let overlay = json!({ "logging": "off" });
        assert_eq!(deep_merge(base, overlay), json!({ "logging": "off" }));
    }

    #[test]
    fn test_merge_all_in_order() {
        let tiers = vec![
            json!({ "a": 1, "b": 1 }),
            Value::Null,
            json!({ "b": 2 }),
            json!({ "b": 3, "c": 3 }),
        ];
        assert_eq!(deep_merge_all(tiers), json!({ "a": 1, "b": 3, "c": 3 }));
    }
}
