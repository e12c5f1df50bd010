//! # Command Layer
//!
//! Pure business logic at the edges of the todo list: turning files into drafts
//! ([`import`]), turning the list into files ([`export`]) and into a shareable
//! summary ([`share`]). Nothing in here touches the store or the terminal.
//!
//! ## Structured Returns
//!
//! The API layer answers every action with a [`CmdResult`]:
//! - `affected`: todos the action created or changed
//! - `listed`: todos to display (derived list for `list`)
//! - `output`: a rendered document (export body, share text)
//! - `messages`: leveled notices (info, success, warning, error)
//!
//! The UI decides how to render these.
//!
//! ## Command Modules
//!
//! - [`import`]: parse and sanitize an import file
//! - [`export`]: JSON and CSV documents, export file names
//! - [`share`]: plain-text summary and the share fallback chain

use crate::model::TodoItem;
use serde::Serialize;

pub mod export;
pub mod import;
pub mod share;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected: Vec<TodoItem>,
    pub listed: Vec<TodoItem>,
    pub output: Option<String>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_message(mut self, message: CmdMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_affected(mut self, todos: Vec<TodoItem>) -> Self {
        self.affected = todos;
        self
    }

    pub fn with_listed(mut self, todos: Vec<TodoItem>) -> Self {
        self.listed = todos;
        self
    }

    pub fn with_output(mut self, output: String) -> Self {
        self.output = Some(output);
        self
    }
}
