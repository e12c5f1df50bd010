//! # API Facade
//!
//! [`TodoApi`] is the single entry point for every client. It sits between the UI
//! and the [`TodoStore`] and owns the rules that belong to the presentation side
//! of the store contract:
//!
//! - **Busy gating**: one mutating action at a time. A second action while one
//!   is in flight fails fast with [`TodoError::Busy`] instead of racing the first.
//! - **Input hygiene**: text is trimmed; an add with empty text is a no-op.
//! - **Completed lock**: completed todos cannot be edited or individually deleted.
//!   They leave the list through clear-completed or clear-all only.
//! - **Empty edit deletes**: saving an edit whose text is blank removes the todo.
//! - **Confirmation**: clear-all, clear-completed and replace-on-import refuse to
//!   run unless the caller says the user confirmed.
//!
//! Every method returns a [`CmdResult`]; failures are logged and propagated.
//!
//! ## What the API Does NOT Do
//!
//! - **I/O**: no stdout, stderr or files. Export returns the document text; the
//!   client decides where it goes.
//! - **Presentation**: returns data, not formatted strings.

use crate::commands::export::{self, ExportFormat};
use crate::commands::import::{self, ImportMode};
use crate::commands::share::{self, ShareTarget, SHARE_FAILED};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::TodozConfig;
use crate::dates::now_ms;
use crate::error::{Result, TodoError};
use crate::model::{NewTodo, TodoEdit, TodoId, TodoItem};
use crate::store::{BackendKind, StorageSelector, TodoStore};
use crate::view::{self, ViewQuery};
use chrono::Utc;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::error;

/// A user-initiated action that holds the busy slot while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Toggle,
    Delete,
    Update,
    ClearAll,
    ClearCompleted,
    ToggleAll,
    Import,
}

impl Action {
    /// Shown while the action is in flight.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Add => "Adding todo…",
            Action::Toggle => "Updating todo…",
            Action::Delete => "Deleting todo…",
            Action::Update => "Saving changes…",
            Action::ClearAll => "Clearing all todos…",
            Action::ClearCompleted => "Removing completed todos…",
            Action::ToggleAll => "Toggling todos…",
            Action::Import => "Importing todos…",
        }
    }

    /// Shown when the action fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Action::Add => "Failed to add todo.",
            Action::Toggle => "Failed to toggle todo.",
            Action::Delete => "Failed to delete todo.",
            Action::Update => "Failed to save edit.",
            Action::ClearAll => "Failed to clear list.",
            Action::ClearCompleted => "Failed to clear completed.",
            Action::ToggleAll => "Failed to toggle all.",
            Action::Import => "Import failed.",
        }
    }
}

/// Releases the busy slot on drop.
pub struct BusyGuard<'a> {
    slot: &'a Mutex<Option<Action>>,
    action: Action,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if *slot == Some(self.action) {
            *slot = None;
        }
    }
}

/// Counts for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreInfo {
    pub backend: Option<BackendKind>,
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

pub struct TodoApi {
    store: TodoStore,
    busy: Mutex<Option<Action>>,
}

impl TodoApi {
    pub fn new(store: TodoStore) -> Self {
        Self {
            store,
            busy: Mutex::new(None),
        }
    }

    pub fn from_config(config: &TodozConfig) -> Self {
        Self::new(TodoStore::new(StorageSelector::from_config(config)))
    }

    pub fn store(&self) -> &TodoStore {
        &self.store
    }

    fn lock_busy(&self) -> MutexGuard<'_, Option<Action>> {
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The action currently holding the busy slot.
    pub fn busy_action(&self) -> Option<Action> {
        *self.lock_busy()
    }

    /// True until storage is ready, and while an action runs.
    pub fn interactions_disabled(&self) -> bool {
        !self.store.is_ready() || self.busy_action().is_some()
    }

    /// Claim the busy slot for `action`.
    pub fn begin(&self, action: Action) -> Result<BusyGuard<'_>> {
        let mut slot = self.lock_busy();
        if let Some(current) = *slot {
            return Err(TodoError::Busy(current.label().to_string()));
        }
        *slot = Some(action);
        Ok(BusyGuard {
            slot: &self.busy,
            action,
        })
    }

    async fn run<T>(&self, action: Action, work: impl Future<Output = Result<T>>) -> Result<T> {
        let _guard = self.begin(action)?;
        work.await.map_err(|e| {
            error!(?action, error = %e, "{}", action.failure_message());
            e
        })
    }

    pub async fn init(&self) -> Result<BackendKind> {
        Ok(self.store.init().await?.kind())
    }

    pub async fn add(&self, input: NewTodo) -> Result<CmdResult> {
        let text = input.text.trim().to_string();
        if text.is_empty() {
            return Ok(CmdResult::default()
                .with_message(CmdMessage::warning("Nothing to add: the todo text is empty.")));
        }
        let input = NewTodo { text, ..input };
        let item = self.run(Action::Add, self.store.add_todo(input)).await?;
        let message = CmdMessage::success(format!("Added: {}", item.text));
        Ok(CmdResult::default()
            .with_affected(vec![item])
            .with_message(message))
    }

    pub async fn toggle(&self, id: TodoId) -> Result<CmdResult> {
        match self.run(Action::Toggle, self.store.toggle_todo(id)).await? {
            Some(item) => {
                let verb = if item.completed { "Completed" } else { "Reopened" };
                let message = CmdMessage::success(format!("{}: {}", verb, item.text));
                Ok(CmdResult::default()
                    .with_affected(vec![item])
                    .with_message(message))
            }
            None => Ok(not_found(id)),
        }
    }

    /// Delete one open todo. Completed todos are locked.
    pub async fn delete(&self, id: TodoId) -> Result<CmdResult> {
        let Some(current) = self.store.get(id) else {
            return Ok(not_found(id));
        };
        if current.completed {
            return Err(TodoError::Locked(id));
        }
        self.run(Action::Delete, self.store.delete_todo(id)).await?;
        Ok(CmdResult::default()
            .with_message(CmdMessage::success(format!("Deleted: {}", current.text))))
    }

    /// Whether the edit entry point is open for `id`.
    pub fn can_edit(&self, id: TodoId) -> bool {
        self.store.get(id).is_some_and(|t| !t.completed)
    }

    /// Save an edit. Blank text deletes the todo instead.
    pub async fn edit(&self, id: TodoId, edit: TodoEdit) -> Result<CmdResult> {
        let Some(current) = self.store.get(id) else {
            return Ok(not_found(id));
        };
        if current.completed {
            return Err(TodoError::Locked(id));
        }
        if edit.is_empty() {
            return Ok(CmdResult::default().with_message(CmdMessage::info("Nothing to change.")));
        }
        if edit.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
            self.run(Action::Delete, self.store.delete_todo(id)).await?;
            return Ok(CmdResult::default().with_message(CmdMessage::success(format!(
                "Deleted: {} (text was emptied)",
                current.text
            ))));
        }

        match self.run(Action::Update, self.store.update_todo(id, edit)).await? {
            Some(item) => {
                let message = CmdMessage::success(format!("Saved: {}", item.text));
                Ok(CmdResult::default()
                    .with_affected(vec![item])
                    .with_message(message))
            }
            None => Ok(not_found(id)),
        }
    }

    pub async fn clear_all(&self, confirmed: bool) -> Result<CmdResult> {
        if !confirmed {
            return Err(TodoError::ConfirmationRequired(
                "Clear all todos? This cannot be undone.".to_string(),
            ));
        }
        let count = self.store.todos().len();
        self.run(Action::ClearAll, self.store.clear_all()).await?;
        Ok(CmdResult::default()
            .with_message(CmdMessage::success(format!("Cleared {} todo(s).", count))))
    }

    pub async fn clear_completed(&self, confirmed: bool) -> Result<CmdResult> {
        if !confirmed {
            return Err(TodoError::ConfirmationRequired(
                "Remove all completed todos?".to_string(),
            ));
        }
        let removed = self
            .run(Action::ClearCompleted, self.store.clear_completed())
            .await?;
        Ok(CmdResult::default().with_message(CmdMessage::success(format!(
            "Removed {} completed todo(s).",
            removed
        ))))
    }

    pub async fn toggle_all(&self) -> Result<CmdResult> {
        let updated = self.run(Action::ToggleAll, self.store.toggle_all()).await?;
        if updated.is_empty() {
            return Ok(CmdResult::default().with_message(CmdMessage::info("No todos to toggle.")));
        }
        let all_done = updated.iter().all(|t| t.completed);
        let message = if all_done {
            format!("Completed {} todo(s).", updated.len())
        } else {
            format!("Reopened {} todo(s).", updated.len())
        };
        Ok(CmdResult::default()
            .with_affected(updated)
            .with_message(CmdMessage::success(message)))
    }

    /// Import from raw file contents. Works before `init`; initializes first.
    pub async fn import(&self, raw: &str, mode: ImportMode) -> Result<CmdResult> {
        self.run(Action::Import, async {
            self.store.init().await?;
            let drafts = import::parse_import(raw, now_ms())?;
            match mode {
                ImportMode::Append => {
                    let added = self.store.add_many(drafts).await?;
                    let message = format!("Imported {} item(s).", added.len());
                    Ok(CmdResult::default()
                        .with_affected(added)
                        .with_message(CmdMessage::success(message)))
                }
                ImportMode::Replace { confirmed: false } => {
                    Err(TodoError::ConfirmationRequired(format!(
                        "Replace all todos with {} imported item(s)?",
                        drafts.len()
                    )))
                }
                ImportMode::Replace { confirmed: true } => {
                    let added = self.store.replace_all(drafts).await?;
                    let message = format!("Replaced with {} item(s).", added.len());
                    Ok(CmdResult::default()
                        .with_affected(added)
                        .with_message(CmdMessage::success(message)))
                }
            }
        })
        .await
    }

    /// Render the whole list. The document is in `output`.
    pub fn export(&self, format: ExportFormat) -> Result<CmdResult> {
        let todos = self.store.todos();
        let document = export::render(format, &todos, Utc::now()).map_err(|e| {
            error!(error = %e, "{}", format.failure_message());
            e
        })?;
        Ok(CmdResult::default()
            .with_output(document)
            .with_message(CmdMessage::success(format.done_message())))
    }

    /// Build the summary and hand it to the first available target. Delivery
    /// failures become an error notice, not an `Err`.
    pub fn share(
        &self,
        native: Option<&dyn ShareTarget>,
        clipboard: Option<&dyn ShareTarget>,
    ) -> CmdResult {
        let text = share::share_text(&self.store.todos());
        let message = match share::deliver(&text, native, clipboard) {
            Ok(outcome) => CmdMessage::info(outcome.message()),
            Err(e) => {
                error!(error = %e, "{}", SHARE_FAILED);
                CmdMessage::error(SHARE_FAILED)
            }
        };
        CmdResult::default().with_output(text).with_message(message)
    }

    /// The derived list. Selected categories nobody uses anymore are dropped
    /// from the filter.
    pub fn list(&self, query: &ViewQuery) -> CmdResult {
        let todos = self.store.todos();
        let used = view::used_categories(&todos);
        let selected: Vec<String> = query
            .categories
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        let kept = view::retain_used_categories(&selected, &used);

        let mut result = CmdResult::default();
        for dropped in selected.iter().filter(|c| !kept.contains(c)) {
            result.add_message(CmdMessage::info(format!(
                "No todos in category '{}'; filter dropped.",
                dropped
            )));
        }
        let effective = ViewQuery {
            categories: kept,
            ..query.clone()
        };
        result.with_listed(view::derive_view(&todos, &effective))
    }

    /// Category options (defaults plus used), fuzzy-matched against `query`.
    pub fn categories(&self, query: &str) -> Vec<String> {
        let used = view::used_categories(&self.store.todos());
        view::fuzzy_filter(&view::category_options(&used), query)
    }

    pub fn todo(&self, id: TodoId) -> Option<TodoItem> {
        self.store.get(id)
    }

    pub fn info(&self) -> StoreInfo {
        let snapshot = self.store.snapshot();
        let pending = snapshot.pending_count();
        StoreInfo {
            backend: snapshot.backend,
            total: snapshot.todos.len(),
            pending,
            completed: snapshot.todos.len() - pending,
        }
    }
}

fn not_found(id: TodoId) -> CmdResult {
    CmdResult::default().with_message(CmdMessage::warning(format!("No todo with id {}.", id)))
}
