//! # Domain Model
//!
//! [`TodoItem`] is the only persisted entity. Everything else in this module is a
//! shape that flows *towards* a stored item:
//!
//! ```text
//! NewTodo  ──normalize──▶ TodoDraft ──backend.add──▶ TodoItem
//! TodoEdit ──normalize──▶ TodoPatch ──backend.update─▶ TodoItem (merged)
//! ```
//!
//! `NewTodo` and `TodoEdit` carry raw presentation input (untrimmed category,
//! `YYYY-MM-DD` due dates, free-form priority names). The store normalizes them
//! into `TodoDraft`/`TodoPatch`, which is what backends see.
//!
//! ## Wire Shape
//!
//! Items serialize with camelCase keys so every tier, export and import share one
//! record layout:
//!
//! ```text
//! { id, text, category, dueAt, priority, completed, createdAt, notes }
//! ```
//!
//! ## Priority
//!
//! Five ordered levels. Unknown or missing names fall back to [`Priority::Medium`];
//! the legacy three-level name `normal` maps to `Medium` as well.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend-assigned identifier. Positive, unique within a list.
pub type TodoId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Priority {
    VeryLow,
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Lowest to highest.
    pub const SCALE: [Priority; 5] = [
        Priority::VeryLow,
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    /// Lenient parse used at every boundary: unrecognized input becomes `Medium`.
    pub fn normalize(raw: &str) -> Self {
        Self::from_name(raw).unwrap_or_default()
    }

    fn from_name(raw: &str) -> Option<Self> {
        match raw.trim() {
            "veryLow" | "very-low" | "verylow" => Some(Priority::VeryLow),
            "low" => Some(Priority::Low),
            "medium" | "normal" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::VeryLow => "veryLow",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Sort rank: urgent first (0), very low last (4).
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
            Priority::VeryLow => 4,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Option<String>> for Priority {
    fn from(raw: Option<String>) -> Self {
        raw.as_deref().map(Priority::normalize).unwrap_or_default()
    }
}

impl From<Priority> for String {
    fn from(p: Priority) -> Self {
        p.as_str().to_string()
    }
}

/// Strict parse for command-line input, where a typo should be reported.
impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::from_name(s).ok_or_else(|| {
            format!(
                "unknown priority '{}' (expected one of: veryLow, low, medium, high, urgent)",
                s
            )
        })
    }
}

/// A stored todo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: TodoId,
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default)]
    pub due_at: Option<i64>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
}

/// Stored records may carry `null` where a field was never set.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A record without an id, submitted to `StorageBackend::add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoDraft {
    pub text: String,
    pub category: String,
    pub due_at: Option<i64>,
    pub priority: Priority,
    pub completed: bool,
    pub created_at: i64,
    pub notes: String,
}

impl TodoDraft {
    pub fn new(text: impl Into<String>, created_at: i64) -> Self {
        Self {
            text: text.into(),
            category: String::new(),
            due_at: None,
            priority: Priority::default(),
            completed: false,
            created_at,
            notes: String::new(),
        }
    }

    pub fn into_item(self, id: TodoId) -> TodoItem {
        TodoItem {
            id,
            text: self.text,
            category: self.category,
            due_at: self.due_at,
            priority: self.priority,
            completed: self.completed,
            created_at: self.created_at,
            notes: self.notes,
        }
    }
}

/// Partial update merged onto an existing record. `None` leaves a field as is.
///
/// `due_at` is doubly optional: `Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub text: Option<String>,
    pub category: Option<String>,
    pub due_at: Option<Option<i64>>,
    pub priority: Option<Priority>,
    pub notes: Option<String>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn completed(value: bool) -> Self {
        Self {
            completed: Some(value),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TodoPatch::default()
    }

    /// Merge onto `item`. `id` and `created_at` are never touched.
    pub fn apply(&self, item: &mut TodoItem) {
        if let Some(text) = &self.text {
            item.text = text.clone();
        }
        if let Some(category) = &self.category {
            item.category = category.clone();
        }
        if let Some(due_at) = self.due_at {
            item.due_at = due_at;
        }
        if let Some(priority) = self.priority {
            item.priority = priority;
        }
        if let Some(notes) = &self.notes {
            item.notes = notes.clone();
        }
        if let Some(completed) = self.completed {
            item.completed = completed;
        }
    }
}

/// Raw input for creating a todo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    pub text: String,
    pub category: String,
    /// `YYYY-MM-DD`, interpreted as local midnight.
    pub due: Option<String>,
    pub priority: Option<String>,
    pub notes: String,
}

impl NewTodo {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_due(mut self, due: impl Into<String>) -> Self {
        self.due = Some(due.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Raw input for editing a todo. Absent fields are left unchanged.
///
/// `due: Some("")` clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoEdit {
    pub text: Option<String>,
    pub category: Option<String>,
    pub due: Option<String>,
    pub priority: Option<String>,
    pub notes: Option<String>,
}

impl TodoEdit {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == TodoEdit::default()
    }
}
