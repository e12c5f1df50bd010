//! # View Pipeline
//!
//! Pure derivation of what to show from the full list:
//!
//! ```text
//! all todos ──filter (status ∧ category ∧ search)──▶ sort (mode) ──▶ derived list
//! ```
//!
//! Nothing here touches the store. Identical inputs always give identical output:
//! every sort is stable and ends on `created_at`.
//!
//! The module also holds the small derived helpers the client needs next to the
//! list: used categories, the category picker options (with fuzzy matching), and
//! pruning of a category selection that no longer matches anything.

use crate::model::TodoItem;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Categories offered before the user has used any.
pub const DEFAULT_CATEGORIES: [&str; 12] = [
    "business",
    "computers",
    "chores",
    "errands",
    "gaming",
    "groceries",
    "music",
    "coding",
    "shopping",
    "travel",
    "network",
    "appointments",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    fn admits(&self, todo: &TodoItem) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !todo.completed,
            StatusFilter::Completed => todo.completed,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" | "done" => Ok(StatusFilter::Completed),
            other => Err(format!(
                "unknown status '{}' (expected all, active or completed)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Open items first, each group by creation time.
    #[default]
    Default,
    /// Open first, then by due date; no due date sorts last.
    Due,
    /// Open first, then by creation time.
    Created,
    /// Open first, then urgent to very low.
    Priority,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Default => "default",
            SortMode::Due => "due",
            SortMode::Created => "created",
            SortMode::Priority => "priority",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(SortMode::Default),
            "due" => Ok(SortMode::Due),
            "created" => Ok(SortMode::Created),
            "priority" => Ok(SortMode::Priority),
            other => Err(format!(
                "unknown sort '{}' (expected default, due, created or priority)",
                other
            )),
        }
    }
}

/// Filter and sort parameters for [`derive_view`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub status: StatusFilter,
    /// Exact, case-sensitive category names. Empty means no restriction.
    pub categories: Vec<String>,
    /// Case-insensitive substring over `"{text} {category}"`.
    pub search: String,
    pub sort: SortMode,
}

impl ViewQuery {
    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }
}

/// Filter then sort. Returns a new list; `todos` is not modified.
pub fn derive_view(todos: &[TodoItem], query: &ViewQuery) -> Vec<TodoItem> {
    let categories: Vec<&str> = query
        .categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    let needle = query.search.to_lowercase();

    let mut list: Vec<TodoItem> = todos
        .iter()
        .filter(|t| matches(t, query.status, &categories, &needle))
        .cloned()
        .collect();
    list.sort_by(|a, b| compare(a, b, query.sort));
    list
}

fn matches(todo: &TodoItem, status: StatusFilter, categories: &[&str], needle: &str) -> bool {
    if !status.admits(todo) {
        return false;
    }
    if !categories.is_empty() && !categories.contains(&todo.category.trim()) {
        return false;
    }
    if !needle.is_empty() {
        let haystack = format!("{} {}", todo.text, todo.category).to_lowercase();
        if !haystack.contains(needle) {
            return false;
        }
    }
    true
}

fn compare(a: &TodoItem, b: &TodoItem, mode: SortMode) -> Ordering {
    // false < true: open items first
    let by_status = a.completed.cmp(&b.completed);
    let by_created = a.created_at.cmp(&b.created_at);
    match mode {
        SortMode::Default | SortMode::Created => by_status.then(by_created),
        SortMode::Due => by_status
            .then_with(|| due_key(a).cmp(&due_key(b)))
            .then(by_created),
        SortMode::Priority => by_status
            .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
            .then(by_created),
    }
}

/// Missing due dates compare as +infinity.
fn due_key(todo: &TodoItem) -> (bool, i64) {
    match todo.due_at {
        Some(due) => (false, due),
        None => (true, 0),
    }
}

/// Number of open items.
pub fn pending_count(todos: &[TodoItem]) -> usize {
    todos.iter().filter(|t| !t.completed).count()
}

/// Trimmed, non-empty categories in first-seen order.
pub fn used_categories(todos: &[TodoItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    todos
        .iter()
        .map(|t| t.category.trim())
        .filter(|c| !c.is_empty() && seen.insert(*c))
        .map(str::to_string)
        .collect()
}

/// Defaults followed by any used category not already among them.
pub fn category_options(used: &[String]) -> Vec<String> {
    let mut options: Vec<String> = DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect();
    for category in used {
        if !options.contains(category) {
            options.push(category.clone());
        }
    }
    options
}

/// Drop selected categories that no todo uses anymore. Order is kept.
pub fn retain_used_categories(selected: &[String], used: &[String]) -> Vec<String> {
    selected
        .iter()
        .filter(|c| used.contains(c))
        .cloned()
        .collect()
}

/// Case-insensitive subsequence match. `Some(score)` on a match, where the score
/// counts matched characters.
fn fuzzy_score(query: &str, text: &str) -> Option<usize> {
    let query: Vec<char> = query.to_lowercase().chars().collect();
    let mut qi = 0;
    for c in text.to_lowercase().chars() {
        if qi == query.len() {
            break;
        }
        if c == query[qi] {
            qi += 1;
        }
    }
    (qi == query.len()).then_some(qi)
}

/// Options matching `query`, best score first, then alphabetical.
/// An empty query keeps every option.
pub fn fuzzy_filter(options: &[String], query: &str) -> Vec<String> {
    let mut scored: Vec<(usize, &String)> = options
        .iter()
        .filter_map(|o| fuzzy_score(query, o).map(|score| (score, o)))
        .collect();
    scored.sort_by(|(sa, a), (sb, b)| {
        sb.cmp(sa)
            .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
            .then_with(|| a.cmp(b))
    });
    scored.into_iter().map(|(_, o)| o.clone()).collect()
}
