use chrono::Utc;
use colored::Colorize;
use timeago::Formatter;
use todoz::api::StoreInfo;
use todoz::commands::{CmdMessage, MessageLevel};
use todoz::dates::to_date_input;
use todoz::model::{Priority, TodoItem};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const ID_WIDTH: usize = 15;
const TIME_WIDTH: usize = 18;
const CATEGORY_WIDTH: usize = 14;
const DONE_MARKER: &str = "✓";
const OPEN_MARKER: &str = "·";

pub(super) fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
            MessageLevel::Error => println!("{}", message.content.red()),
        }
    }
}

pub(super) fn print_todos(todos: &[TodoItem], pending: usize) {
    if todos.is_empty() {
        println!("No todos found.");
        return;
    }

    let now_ms = Utc::now().timestamp_millis();
    for todo in todos {
        println!("{}", format_row(todo, now_ms));
        if !todo.notes.trim().is_empty() {
            let indent = " ".repeat(ID_WIDTH + 4);
            let available = LINE_WIDTH.saturating_sub(indent.width());
            println!("{}{}", indent, truncate_to_width(todo.notes.trim(), available).dimmed());
        }
    }
    println!();
    println!("{}", format!("{} item(s) left", pending).dimmed());
}

fn format_row(todo: &TodoItem, now_ms: i64) -> String {
    let id = format!("{:>width$} ", todo.id, width = ID_WIDTH - 1);
    let marker = if todo.completed { DONE_MARKER } else { OPEN_MARKER };
    let priority = priority_badge(todo.priority);
    let category = if todo.category.is_empty() {
        " ".repeat(CATEGORY_WIDTH)
    } else {
        let shown = truncate_to_width(&todo.category, CATEGORY_WIDTH - 1);
        format!("{:<width$}", shown, width = CATEGORY_WIDTH)
    };
    let when = match todo.due_at {
        Some(due) => format_due(due, now_ms),
        None => format_time_ago(todo.created_at, now_ms),
    };

    let fixed = ID_WIDTH + 2 + 2 + CATEGORY_WIDTH + TIME_WIDTH;
    let available = LINE_WIDTH.saturating_sub(fixed);
    let text = truncate_to_width(&todo.text, available);
    let padding = available.saturating_sub(text.width());

    let text = if todo.completed {
        text.dimmed().strikethrough().to_string()
    } else {
        text
    };
    let marker = if todo.completed {
        marker.green()
    } else {
        marker.normal()
    };
    let overdue = !todo.completed && todo.due_at.is_some_and(|due| due < now_ms);
    let when = if overdue { when.red() } else { when.dimmed() };

    format!(
        "{}{} {} {}{}{}{}",
        id.yellow(),
        marker,
        priority,
        text,
        " ".repeat(padding),
        category.cyan(),
        when
    )
}

fn priority_badge(priority: Priority) -> colored::ColoredString {
    match priority {
        Priority::Urgent => "!".red().bold(),
        Priority::High => "!".yellow(),
        Priority::Medium => " ".normal(),
        Priority::Low => "↓".dimmed(),
        Priority::VeryLow => "↓".dimmed(),
    }
}

fn format_due(due_ms: i64, now_ms: i64) -> String {
    let date = to_date_input(due_ms);
    let label = if due_ms < now_ms {
        format!("was due {}", date)
    } else {
        format!("due {}", date)
    };
    format!("{:>width$}", label, width = TIME_WIDTH)
}

pub(super) fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(created_ms: i64, now_ms: i64) -> String {
    let elapsed = std::time::Duration::from_millis(now_ms.saturating_sub(created_ms).max(0) as u64);
    let time_str = Formatter::new().convert(elapsed);
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

pub(super) fn print_info(info: &StoreInfo) {
    let backend = info.backend.map(|b| b.to_string());
    let rows = [
        ("storage", backend.unwrap_or_else(|| "not ready".to_string())),
        ("total", info.total.to_string()),
        ("open", info.pending.to_string()),
        ("completed", info.completed.to_string()),
    ];
    for (label, value) in rows {
        println!("{} {}", format!("{:<10}", label).bold(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todoz::model::TodoDraft;

    #[test]
    fn test_truncate_to_width_fits() {
        assert_eq!(truncate_to_width("short", 10), "short");
    }

    #[test]
    fn test_truncate_to_width_adds_ellipsis() {
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_truncate_counts_wide_chars() {
        // Each CJK char is two columns wide.
        assert_eq!(truncate_to_width("日本語テキスト", 7), "日本語…");
    }

    #[test]
    fn test_time_ago_is_right_aligned() {
        let s = format_time_ago(0, 3_600_000);
        assert_eq!(s.width(), TIME_WIDTH);
        assert!(s.contains("hour"));
    }

    #[test]
    fn test_row_contains_id_and_text() {
        colored::control::set_override(false);
        let todo = TodoDraft::new("Water the plants", 1_000).into_item(1_700_000_000_000);
        let row = format_row(&todo, 2_000);
        assert!(row.contains("1700000000000"));
        assert!(row.contains("Water the plants"));
    }

    #[test]
    fn test_due_label_uses_input_date_format() {
        let due = todoz::dates::parse_date_local("2024-03-09").unwrap();
        let upcoming = format_due(due, due - 1);
        assert_eq!(upcoming.trim_start(), "due 2024-03-09");
        assert_eq!(upcoming.width(), TIME_WIDTH);

        let overdue = format_due(due, due + 1);
        assert_eq!(overdue.trim_start(), "was due 2024-03-09");
        assert_eq!(overdue.width(), TIME_WIDTH);
    }
}
