//! Plain-text list summary and the share fallback chain.
//!
//! ```text
//! Todo List (2 open, 1 done)
//!
//! • Buy milk
//! • Call mom
//!
//! Completed:
//! ✓ Pay rent
//! ```
//!
//! Delivery tries a native share target first, then the clipboard, and reports
//! `Unsupported` when neither exists.

use crate::error::Result;
use crate::model::TodoItem;

pub const SHARE_TITLE: &str = "My Todo List";

/// Something that can take the summary off our hands.
pub trait ShareTarget {
    fn deliver(&self, title: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    Copied,
    Unsupported,
}

impl ShareOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            ShareOutcome::Shared => "Shared.",
            ShareOutcome::Copied => "Copied to clipboard.",
            ShareOutcome::Unsupported => "Sharing not supported.",
        }
    }
}

pub const SHARE_FAILED: &str = "Share failed.";

/// Summary in list order: open items as bullets, completed items checked.
pub fn share_text(todos: &[TodoItem]) -> String {
    let (done, open): (Vec<&TodoItem>, Vec<&TodoItem>) = todos.iter().partition(|t| t.completed);

    let header = format!("Todo List ({} open, {} done)", open.len(), done.len());
    let body_open = if open.is_empty() {
        "(no open items)".to_string()
    } else {
        open.iter()
            .map(|t| format!("• {}", t.text))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let body_done = if done.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = done.iter().map(|t| format!("✓ {}", t.text)).collect();
        format!("\n\nCompleted:\n{}", lines.join("\n"))
    };

    format!("{}\n\n{}{}", header, body_open, body_done)
}

/// Deliver `text` through the first available target.
pub fn deliver(
    text: &str,
    native: Option<&dyn ShareTarget>,
    clipboard: Option<&dyn ShareTarget>,
) -> Result<ShareOutcome> {
    if let Some(target) = native {
        target.deliver(SHARE_TITLE, text)?;
        return Ok(ShareOutcome::Shared);
    }
    if let Some(target) = clipboard {
        target.deliver(SHARE_TITLE, text)?;
        return Ok(ShareOutcome::Copied);
    }
    Ok(ShareOutcome::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TodoError;
    use crate::model::TodoDraft;
    use std::cell::RefCell;

    fn todo(id: i64, text: &str, completed: bool) -> TodoItem {
        let mut t = TodoDraft::new(text, id).into_item(id);
        t.completed = completed;
        t
    }

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<String>>,
        fail: bool,
    }

    impl ShareTarget for Recorder {
        fn deliver(&self, _title: &str, text: &str) -> Result<()> {
            if self.fail {
                return Err(TodoError::InvalidInput("no clipboard".into()));
            }
            self.seen.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_share_text_with_both_groups() {
        let todos = vec![
            todo(1, "Buy milk", false),
            todo(2, "Pay rent", true),
            todo(3, "Call mom", false),
        ];
        assert_eq!(
            share_text(&todos),
            "Todo List (2 open, 1 done)\n\n• Buy milk\n• Call mom\n\nCompleted:\n✓ Pay rent"
        );
    }

    #[test]
    fn test_share_text_empty() {
        assert_eq!(share_text(&[]), "Todo List (0 open, 0 done)\n\n(no open items)");
    }

    #[test]
    fn test_deliver_prefers_native() {
        let native = Recorder::default();
        let clipboard = Recorder::default();
        let outcome = deliver("x", Some(&native), Some(&clipboard)).unwrap();
        assert_eq!(outcome, ShareOutcome::Shared);
        assert_eq!(native.seen.borrow().len(), 1);
        assert!(clipboard.seen.borrow().is_empty());
    }

    #[test]
    fn test_deliver_falls_back_to_clipboard() {
        let clipboard = Recorder::default();
        assert_eq!(
            deliver("x", None, Some(&clipboard)).unwrap(),
            ShareOutcome::Copied
        );
        assert_eq!(deliver("x", None, None).unwrap(), ShareOutcome::Unsupported);
    }

    #[test]
    fn test_deliver_failure_propagates() {
        let broken = Recorder {
            fail: true,
            ..Default::default()
        };
        assert!(deliver("x", None, Some(&broken)).is_err());
    }
}
