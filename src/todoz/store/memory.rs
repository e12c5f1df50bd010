use super::ids::{max_id, IdGenerator};
use super::{BackendKind, StorageBackend};
use crate::error::{Result, TodoError};
use crate::model::{TodoDraft, TodoId, TodoItem, TodoPatch};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct MemState {
    items: Vec<TodoItem>,
    ids: IdGenerator,
    simulate_write_error: bool,
    failing_ids: HashSet<TodoId>,
}

impl MemState {
    fn check_write(&self, id: Option<TodoId>) -> Result<()> {
        if self.simulate_write_error {
            return Err(TodoError::Persistence("Simulated write error".to_string()));
        }
        if let Some(id) = id {
            if self.failing_ids.contains(&id) {
                return Err(TodoError::Persistence(format!(
                    "Simulated write error for {}",
                    id
                )));
            }
        }
        Ok(())
    }
}

/// Process-local storage. Nothing survives the process.
///
/// Terminal fallback of the selector, and the backend used by most tests. The
/// `set_simulate_write_error`/`fail_writes_for` switches let tests exercise the
/// store's failure paths.
#[derive(Default)]
pub struct MemBackend {
    state: Mutex<MemState>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records, ids kept as given.
    pub fn with_items(items: Vec<TodoItem>) -> Self {
        let backend = Self::new();
        backend.lock().items = items;
        backend
    }

    /// Make every write fail.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.lock().simulate_write_error = simulate;
    }

    /// Make updates and deletes addressing `id` fail.
    pub fn fail_writes_for(&self, id: TodoId) {
        self.lock().failing_ids.insert(id);
    }

    fn lock(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StorageBackend for MemBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn get_all(&self) -> Result<Vec<TodoItem>> {
        Ok(self.lock().items.clone())
    }

    async fn add(&self, draft: TodoDraft) -> Result<TodoItem> {
        let mut state = self.lock();
        state.check_write(None)?;
        let floor = max_id(state.items.iter().map(|t| &t.id));
        let item = draft.into_item(state.ids.next(floor));
        state.items.push(item.clone());
        Ok(item)
    }

    async fn update(&self, id: TodoId, patch: TodoPatch) -> Result<Option<TodoItem>> {
        let mut state = self.lock();
        state.check_write(Some(id))?;
        match state.items.iter_mut().find(|t| t.id == id) {
            Some(item) => {
                patch.apply(item);
                Ok(Some(item.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: TodoId) -> Result<()> {
        let mut state = self.lock();
        state.check_write(Some(id))?;
        state.items.retain(|t| t.id != id);
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut state = self.lock();
        state.check_write(None)?;
        state.items.clear();
        Ok(())
    }
}
