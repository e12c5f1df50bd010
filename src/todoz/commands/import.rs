//! Import file parsing.
//!
//! Accepted shapes: a bare array of records, or an object holding an `items` or
//! `todos` array. Each record is sanitized on its own:
//!
//! | field       | accepted                         | otherwise          |
//! |-------------|----------------------------------|--------------------|
//! | `text`      | string                           | `""` (record dropped) |
//! | `category`  | string                           | `""`               |
//! | `dueAt`     | number, or numeric string        | `null`             |
//! | `priority`  | known name                       | `medium`           |
//! | `completed` | any value, by truthiness         |                    |
//! | `createdAt` | number                           | now                |
//! | `notes`     | string                           | `""`               |
//!
//! Records whose text trims to empty are dropped. Ids are never imported; the
//! backend assigns fresh ones.

use crate::error::{Result, TodoError};
use crate::model::{Priority, TodoDraft};
use serde_json::Value;

pub const NO_ITEMS: &str = "No items found in file.";
pub const NOTHING_TO_IMPORT: &str = "Nothing to import.";

/// How imported drafts meet the existing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Append,
    /// Replace everything. Refused unless `confirmed`.
    Replace { confirmed: bool },
}

/// Parse `raw` and sanitize every record. Fails if the input is not JSON, has no
/// record array, or nothing survives sanitation.
pub fn parse_import(raw: &str, now_ms: i64) -> Result<Vec<TodoDraft>> {
    let json: Value = serde_json::from_str(raw)
        .map_err(|e| TodoError::ImportFormat(format!("Import failed: invalid JSON ({})", e)))?;

    let records: &[Value] = match &json {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match (map.get("items"), map.get("todos")) {
            (Some(Value::Array(items)), _) => items.as_slice(),
            (_, Some(Value::Array(todos))) => todos.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    if records.is_empty() {
        return Err(TodoError::ImportFormat(NO_ITEMS.to_string()));
    }

    let drafts: Vec<TodoDraft> = records
        .iter()
        .map(|r| sanitize_record(r, now_ms))
        .filter(|d| !d.text.trim().is_empty())
        .collect();
    if drafts.is_empty() {
        return Err(TodoError::ImportFormat(NOTHING_TO_IMPORT.to_string()));
    }
    Ok(drafts)
}

pub fn sanitize_record(record: &Value, now_ms: i64) -> TodoDraft {
    let string_field = |key: &str| {
        record
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    TodoDraft {
        text: string_field("text"),
        category: string_field("category"),
        due_at: record.get("dueAt").and_then(numeric),
        priority: record
            .get("priority")
            .and_then(Value::as_str)
            .map(Priority::normalize)
            .unwrap_or_default(),
        completed: record.get("completed").map(truthy).unwrap_or(false),
        created_at: record
            .get("createdAt")
            .and_then(Value::as_f64)
            .filter(|n| n.is_finite())
            .map(|n| n as i64)
            .unwrap_or(now_ms),
        notes: string_field("notes"),
    }
}

/// A number, or a string that reads as one. Blank strings are not dates.
fn numeric(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n as i64)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_non_string_text_is_dropped() {
        let raw = r#"[{"text":123},{"text":"ok"}]"#;
        let drafts = parse_import(raw, NOW).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].text, "ok");
    }

    #[test]
    fn test_accepts_items_and_todos_wrappers() {
        let items = r#"{"version":1,"items":[{"text":"a"}]}"#;
        let todos = r#"{"todos":[{"text":"b"},{"text":"c"}]}"#;
        assert_eq!(parse_import(items, NOW).unwrap().len(), 1);
        assert_eq!(parse_import(todos, NOW).unwrap().len(), 2);
    }

    #[test]
    fn test_sanitizes_fields() {
        let raw = r#"[{
            "id": 99,
            "text": "Pay rent",
            "category": 5,
            "dueAt": "1700000000000",
            "priority": "normal",
            "completed": "yes",
            "notes": null
        }]"#;
        let d = &parse_import(raw, NOW).unwrap()[0];
        assert_eq!(d.category, "");
        assert_eq!(d.due_at, Some(1_700_000_000_000));
        assert_eq!(d.priority, Priority::Medium);
        assert!(d.completed);
        assert_eq!(d.created_at, NOW);
        assert_eq!(d.notes, "");
    }

    #[test]
    fn test_due_at_rejects_non_numeric() {
        let raw = r#"[
            {"text":"a","dueAt":"soon"},
            {"text":"b","dueAt":true},
            {"text":"c","dueAt":""},
            {"text":"d","dueAt":42}
        ]"#;
        let due: Vec<Option<i64>> = parse_import(raw, NOW)
            .unwrap()
            .iter()
            .map(|d| d.due_at)
            .collect();
        assert_eq!(due, vec![None, None, None, Some(42)]);
    }

    #[test]
    fn test_completed_truthiness() {
        let raw = r#"[
            {"text":"a","completed":0},
            {"text":"b","completed":1},
            {"text":"c","completed":""},
            {"text":"d","completed":{}}
        ]"#;
        let done: Vec<bool> = parse_import(raw, NOW)
            .unwrap()
            .iter()
            .map(|d| d.completed)
            .collect();
        assert_eq!(done, vec![false, true, false, true]);
    }

    #[test]
    fn test_keeps_numeric_created_at() {
        let drafts = parse_import(r#"[{"text":"a","createdAt":123}]"#, NOW).unwrap();
        assert_eq!(drafts[0].created_at, 123);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse_import("not json", NOW),
            Err(TodoError::ImportFormat(_))
        ));
        assert_eq!(
            parse_import(r#"{"foo":[]}"#, NOW).unwrap_err(),
            TodoError::ImportFormat(NO_ITEMS.to_string())
        );
        assert_eq!(
            parse_import("[]", NOW).unwrap_err(),
            TodoError::ImportFormat(NO_ITEMS.to_string())
        );
        assert_eq!(
            parse_import(r#"[{"text":"   "},null,7]"#, NOW).unwrap_err(),
            TodoError::ImportFormat(NOTHING_TO_IMPORT.to_string())
        );
    }
}
