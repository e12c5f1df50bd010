//! Export documents.
//!
//! JSON:
//!
//! ```text
//! { "version": 1, "exportedAt": "<ISO-8601>", "count": N, "items": [ {record}, ... ] }
//! ```
//!
//! CSV: header `text,category,dueAt,priority,completed,createdAt`, one row per
//! todo, `completed` as `1`/`0`. Fields holding a comma, quote or newline are
//! wrapped in quotes with inner quotes doubled.

use crate::error::Result;
use crate::model::TodoItem;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

pub const EXPORT_VERSION: u32 = 1;

const CSV_HEADERS: [&str; 6] = [
    "text",
    "category",
    "dueAt",
    "priority",
    "completed",
    "createdAt",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn done_message(&self) -> &'static str {
        match self {
            ExportFormat::Json => "Exported list.",
            ExportFormat::Csv => "Exported CSV.",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            ExportFormat::Json => "Export failed.",
            ExportFormat::Csv => "CSV export failed.",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    version: u32,
    exported_at: String,
    count: usize,
    items: &'a [TodoItem],
}

pub fn render(format: ExportFormat, todos: &[TodoItem], at: DateTime<Utc>) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(todos, at),
        ExportFormat::Csv => Ok(to_csv(todos)),
    }
}

/// Pretty-printed with two-space indentation.
pub fn to_json(todos: &[TodoItem], at: DateTime<Utc>) -> Result<String> {
    let doc = ExportDocument {
        version: EXPORT_VERSION,
        exported_at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        count: todos.len(),
        items: todos,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Rows joined by `\n`, no trailing newline.
pub fn to_csv(todos: &[TodoItem]) -> String {
    let mut rows = vec![CSV_HEADERS.join(",")];
    for todo in todos {
        let fields = [
            escape_csv(&todo.text),
            escape_csv(&todo.category),
            todo.due_at.map(|d| d.to_string()).unwrap_or_default(),
            escape_csv(todo.priority.as_str()),
            if todo.completed { "1" } else { "0" }.to_string(),
            todo.created_at.to_string(),
        ];
        rows.push(fields.join(","));
    }
    rows.join("\n")
}

fn escape_csv(value: &str) -> String {
    if value.contains(['"', '\n', ',']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// `todos-YYYY-MM-DD-HH-MM-SS.<ext>`, in UTC.
pub fn export_filename(format: ExportFormat, at: DateTime<Utc>) -> String {
    format!(
        "todos-{}.{}",
        at.format("%Y-%m-%d-%H-%M-%S"),
        format.extension()
    )
}
