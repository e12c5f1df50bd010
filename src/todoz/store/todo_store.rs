//! # Todo Store
//!
//! The single source of truth for the todo list. It owns the selected backend and
//! an in-memory mirror of what that backend holds, and it is the only code that
//! calls the storage contract.
//!
//! ## Initialization
//!
//! ```text
//!          init()                 init() (concurrent)
//!            │                          │
//!   Idle ──spawn──▶ InFlight(rx) ◀──clone rx──┘
//!                     │
//!           select + get_all
//!             │            │
//!           Ok(_)        Err(_)
//!             ▼            ▼
//!      Ready(backend)    Idle  (a later init() retries)
//! ```
//!
//! Every caller that arrives while an attempt is in flight waits on the same
//! watch channel, so the selector runs once no matter how many callers race.
//! The attempt runs in its own task: a caller that stops waiting does not cancel it.
//!
//! ## Memory Mirror
//!
//! The list is published through a `tokio::sync::watch` channel as a
//! [`TodoSnapshot`]. Each mutation builds a new `Vec` and swaps the `Arc`, so a
//! snapshot a reader already holds never changes underneath it. Memory is only
//! touched after the backend call succeeds.
//!
//! ## Bulk Operations
//!
//! `clear_completed`, `toggle_all`, `add_many` and `replace_all` spawn one backend
//! call per item and join them all. Memory is committed only if every call
//! succeeded; otherwise the first error is returned and memory is left as it was.
//! [`TodoStore::refresh`] reloads memory from the backend afterwards if needed.
//!
//! Conflicting concurrent calls on the same id are not serialized here; the
//! caller gates them (see `api::TodoApi`).

use super::selector::StorageSelector;
use super::{BackendKind, StorageBackend};
use crate::dates::{now_ms, parse_date_local};
use crate::error::{Result, TodoError};
use crate::model::{NewTodo, Priority, TodoDraft, TodoEdit, TodoId, TodoItem, TodoPatch};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type InitOutcome = Option<Result<Arc<dyn StorageBackend>>>;

enum InitPhase {
    Idle,
    InFlight(watch::Receiver<InitOutcome>),
    Ready(Arc<dyn StorageBackend>),
}

/// What observers see: the current list plus readiness.
#[derive(Debug, Clone, Default)]
pub struct TodoSnapshot {
    pub todos: Arc<Vec<TodoItem>>,
    pub ready: bool,
    pub backend: Option<BackendKind>,
}

impl TodoSnapshot {
    pub fn pending_count(&self) -> usize {
        self.todos.iter().filter(|t| !t.completed).count()
    }

    pub fn get(&self, id: TodoId) -> Option<&TodoItem> {
        self.todos.iter().find(|t| t.id == id)
    }
}

struct Inner {
    selector: StorageSelector,
    phase: Mutex<InitPhase>,
    state: watch::Sender<TodoSnapshot>,
}

impl Inner {
    fn lock_phase(&self) -> MutexGuard<'_, InitPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_init(&self) -> Result<Arc<dyn StorageBackend>> {
        let backend = self.selector.select().await;
        match backend.get_all().await {
            Ok(items) => {
                let kind = backend.kind();
                *self.lock_phase() = InitPhase::Ready(backend.clone());
                info!(backend = %kind, count = items.len(), "todo store ready");
                self.state.send_modify(|s| {
                    s.todos = Arc::new(items);
                    s.ready = true;
                    s.backend = Some(kind);
                });
                Ok(backend)
            }
            Err(e) => {
                *self.lock_phase() = InitPhase::Idle;
                warn!(error = %e, "todo store failed to load");
                Err(e)
            }
        }
    }

    fn reset_stalled_init(&self) {
        let mut phase = self.lock_phase();
        if matches!(*phase, InitPhase::InFlight(_)) {
            *phase = InitPhase::Idle;
        }
    }

    /// Publish a new list computed from the current one.
    fn commit(&self, f: impl FnOnce(&[TodoItem]) -> Vec<TodoItem>) {
        self.state.send_modify(|s| {
            s.todos = Arc::new(f(s.todos.as_slice()));
        });
    }
}

/// Cheap to clone; clones share the same backend and list.
#[derive(Clone)]
pub struct TodoStore {
    inner: Arc<Inner>,
}

impl TodoStore {
    pub fn new(selector: StorageSelector) -> Self {
        let (state, _) = watch::channel(TodoSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                selector,
                phase: Mutex::new(InitPhase::Idle),
                state,
            }),
        }
    }

    /// Select a backend and load the list. Safe to call any number of times,
    /// concurrently; at most one attempt is ever in flight.
    pub async fn init(&self) -> Result<Arc<dyn StorageBackend>> {
        let mut rx = {
            let mut phase = self.inner.lock_phase();
            let pending = match &*phase {
                InitPhase::Ready(backend) => return Ok(backend.clone()),
                InitPhase::InFlight(rx) => Some(rx.clone()),
                InitPhase::Idle => None,
            };
            match pending {
                Some(rx) => rx,
                None => {
                    let (tx, rx) = watch::channel(None);
                    *phase = InitPhase::InFlight(rx.clone());
                    let inner = self.inner.clone();
                    tokio::spawn(async move {
                        let outcome = inner.run_init().await;
                        tx.send_replace(Some(outcome));
                    });
                    rx
                }
            }
        };

        let outcome = rx.wait_for(Option::is_some).await.map(|v| (*v).clone());
        match outcome {
            Ok(Some(result)) => result,
            _ => {
                self.inner.reset_stalled_init();
                Err(TodoError::StorageUnavailable(
                    "initialization ended without a result".to_string(),
                ))
            }
        }
    }

    fn backend(&self) -> Result<Arc<dyn StorageBackend>> {
        match &*self.inner.lock_phase() {
            InitPhase::Ready(backend) => Ok(backend.clone()),
            _ => Err(TodoError::StorageNotReady),
        }
    }

    pub fn snapshot(&self) -> TodoSnapshot {
        self.inner.state.borrow().clone()
    }

    pub fn todos(&self) -> Arc<Vec<TodoItem>> {
        self.inner.state.borrow().todos.clone()
    }

    pub fn get(&self, id: TodoId) -> Option<TodoItem> {
        self.inner.state.borrow().get(id).cloned()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.state.borrow().ready
    }

    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.inner.state.borrow().backend
    }

    pub fn pending_count(&self) -> usize {
        self.inner.state.borrow().pending_count()
    }

    /// Observe every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<TodoSnapshot> {
        self.inner.state.subscribe()
    }

    pub async fn add_todo(&self, input: NewTodo) -> Result<TodoItem> {
        let backend = self.backend()?;
        let draft = draft_from_input(input, now_ms())?;
        let item = backend.add(draft).await?;
        let added = item.clone();
        self.inner.commit(move |todos| {
            let mut next = todos.to_vec();
            next.push(added);
            next
        });
        Ok(item)
    }

    /// Flip `completed`. `Ok(None)` if the id is unknown.
    pub async fn toggle_todo(&self, id: TodoId) -> Result<Option<TodoItem>> {
        let backend = self.backend()?;
        let Some(current) = self.get(id) else {
            return Ok(None);
        };
        let updated = backend
            .update(id, TodoPatch::completed(!current.completed))
            .await?;
        if let Some(item) = &updated {
            self.replace_one(item.clone());
        }
        Ok(updated)
    }

    /// Apply an edit. `Ok(None)` if the backend has no such id; memory is then
    /// left untouched.
    pub async fn update_todo(&self, id: TodoId, edit: TodoEdit) -> Result<Option<TodoItem>> {
        let backend = self.backend()?;
        let patch = patch_from_edit(edit)?;
        let updated = backend.update(id, patch).await?;
        if let Some(item) = &updated {
            self.replace_one(item.clone());
        }
        Ok(updated)
    }

    /// Idempotent: a missing id is not an error.
    pub async fn delete_todo(&self, id: TodoId) -> Result<()> {
        let backend = self.backend()?;
        backend.delete(id).await?;
        self.inner
            .commit(|todos| todos.iter().filter(|t| t.id != id).cloned().collect());
        Ok(())
    }

    pub async fn clear_all(&self) -> Result<()> {
        let backend = self.backend()?;
        backend.clear_all().await?;
        self.inner.commit(|_| Vec::new());
        Ok(())
    }

    /// Delete every completed item. Returns how many were removed.
    pub async fn clear_completed(&self) -> Result<usize> {
        let backend = self.backend()?;
        let ids: Vec<TodoId> = self
            .todos()
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.id)
            .collect();
        if ids.is_empty() {
            return Ok(0);
        }

        fan_out("clear_completed", &backend, ids.clone(), |b, id| async move {
            b.delete(id).await
        })
        .await?;

        let removed: HashSet<TodoId> = ids.iter().copied().collect();
        self.inner.commit(|todos| {
            todos
                .iter()
                .filter(|t| !removed.contains(&t.id))
                .cloned()
                .collect()
        });
        Ok(ids.len())
    }

    /// Complete everything, or reopen everything if all items are already done.
    pub async fn toggle_all(&self) -> Result<Vec<TodoItem>> {
        let backend = self.backend()?;
        let todos = self.todos();
        if todos.is_empty() {
            return Ok(Vec::new());
        }
        let target = todos.iter().any(|t| !t.completed);
        let ids: Vec<TodoId> = todos.iter().map(|t| t.id).collect();

        let results = fan_out("toggle_all", &backend, ids, move |b, id| async move {
            b.update(id, TodoPatch::completed(target)).await
        })
        .await?;

        let updated: Vec<TodoItem> = results.into_iter().flatten().collect();
        let by_id: HashMap<TodoId, TodoItem> =
            updated.iter().map(|t| (t.id, t.clone())).collect();
        self.inner.commit(|todos| {
            todos
                .iter()
                .map(|t| by_id.get(&t.id).cloned().unwrap_or_else(|| t.clone()))
                .collect()
        });
        Ok(updated)
    }

    /// Add every draft concurrently and append the stored records.
    pub async fn add_many(&self, drafts: Vec<TodoDraft>) -> Result<Vec<TodoItem>> {
        let backend = self.backend()?;
        let added = fan_out("add_many", &backend, drafts, |b, draft| async move {
            b.add(draft).await
        })
        .await?;

        let appended = added.clone();
        self.inner.commit(move |todos| {
            let mut next = todos.to_vec();
            next.extend(appended);
            next
        });
        Ok(added)
    }

    /// Clear the backend, add every draft, and make memory exactly the result.
    pub async fn replace_all(&self, drafts: Vec<TodoDraft>) -> Result<Vec<TodoItem>> {
        let backend = self.backend()?;
        backend.clear_all().await?;
        let added = fan_out("replace_all", &backend, drafts, |b, draft| async move {
            b.add(draft).await
        })
        .await?;

        let replaced = added.clone();
        self.inner.commit(move |_| replaced);
        Ok(added)
    }

    /// Reload memory from the backend.
    pub async fn refresh(&self) -> Result<()> {
        let backend = self.backend()?;
        let items = backend.get_all().await?;
        self.inner.commit(move |_| items);
        Ok(())
    }

    fn replace_one(&self, item: TodoItem) {
        self.inner.commit(move |todos| {
            todos
                .iter()
                .map(|t| if t.id == item.id { item.clone() } else { t.clone() })
                .collect()
        });
    }
}

/// Run `op` once per input, all concurrently, and wait for every one to settle.
/// Returns the first error, if any, only after all calls have finished.
async fn fan_out<I, T, F, Fut>(
    label: &'static str,
    backend: &Arc<dyn StorageBackend>,
    inputs: Vec<I>,
    op: F,
) -> Result<Vec<T>>
where
    F: Fn(Arc<dyn StorageBackend>, I) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    debug!(op = label, count = inputs.len(), "bulk storage calls");
    let handles: Vec<JoinHandle<Result<T>>> = inputs
        .into_iter()
        .map(|input| tokio::spawn(op(backend.clone(), input)))
        .collect();

    let total = handles.len();
    let mut results = Vec::with_capacity(total);
    let mut first_error = None;
    for handle in handles {
        match handle.await {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => {
                first_error.get_or_insert(TodoError::Persistence(format!(
                    "storage task failed: {}",
                    e
                )));
            }
        }
    }

    match first_error {
        Some(e) => {
            warn!(
                op = label,
                succeeded = results.len(),
                failed = total - results.len(),
                error = %e,
                "bulk operation failed, memory left unchanged"
            );
            Err(e)
        }
        None => Ok(results),
    }
}

fn draft_from_input(input: NewTodo, created_at: i64) -> Result<TodoDraft> {
    let text = input.text.trim();
    if text.is_empty() {
        return Err(TodoError::InvalidInput("todo text is empty".to_string()));
    }
    Ok(TodoDraft {
        text: text.to_string(),
        category: input.category.trim().to_string(),
        due_at: input.due.as_deref().and_then(parse_date_local),
        priority: input
            .priority
            .as_deref()
            .map(Priority::normalize)
            .unwrap_or_default(),
        completed: false,
        created_at,
        notes: input.notes,
    })
}

fn patch_from_edit(edit: TodoEdit) -> Result<TodoPatch> {
    let text = match edit.text {
        Some(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(TodoError::InvalidInput("todo text is empty".to_string()));
            }
            Some(trimmed.to_string())
        }
        None => None,
    };
    Ok(TodoPatch {
        text,
        category: edit.category.map(|c| c.trim().to_string()),
        due_at: edit.due.map(|d| parse_date_local(&d)),
        priority: edit.priority.as_deref().map(Priority::normalize),
        notes: edit.notes,
        completed: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemBackend;
    use crate::store::selector::BackendFactory;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Hands out one shared MemBackend, counting how often it is asked.
    struct Fixed {
        backend: Arc<MemBackend>,
        opens: Arc<AtomicUsize>,
        delay: Duration,
    }

    #[async_trait]
    impl BackendFactory for Fixed {
        fn kind(&self) -> BackendKind {
            BackendKind::Memory
        }

        async fn open(&self) -> Result<Arc<dyn StorageBackend>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(self.backend.clone())
        }
    }

    /// A backend whose list cannot be read.
    struct Unreadable;

    #[async_trait]
    impl StorageBackend for Unreadable {
        fn kind(&self) -> BackendKind {
            BackendKind::KeyValue
        }
        async fn get_all(&self) -> Result<Vec<TodoItem>> {
            Err(TodoError::Persistence("corrupt".to_string()))
        }
        async fn add(&self, _: TodoDraft) -> Result<TodoItem> {
            Err(TodoError::Persistence("corrupt".to_string()))
        }
        async fn update(&self, _: TodoId, _: TodoPatch) -> Result<Option<TodoItem>> {
            Ok(None)
        }
        async fn delete(&self, _: TodoId) -> Result<()> {
            Ok(())
        }
        async fn clear_all(&self) -> Result<()> {
            Ok(())
        }
    }

    /// Unreadable on the first open, healthy afterwards.
    struct FlakyOnce {
        opens: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BackendFactory for FlakyOnce {
        fn kind(&self) -> BackendKind {
            BackendKind::KeyValue
        }

        async fn open(&self) -> Result<Arc<dyn StorageBackend>> {
            if self.opens.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(Arc::new(Unreadable))
            } else {
                Ok(Arc::new(MemBackend::new()))
            }
        }
    }

    /// Delegates to a MemBackend whose writes start failing once it is cleared.
    struct FailsAfterClear(Arc<MemBackend>);

    #[async_trait]
    impl StorageBackend for FailsAfterClear {
        fn kind(&self) -> BackendKind {
            BackendKind::Memory
        }
        async fn get_all(&self) -> Result<Vec<TodoItem>> {
            self.0.get_all().await
        }
        async fn add(&self, draft: TodoDraft) -> Result<TodoItem> {
            self.0.add(draft).await
        }
        async fn update(&self, id: TodoId, patch: TodoPatch) -> Result<Option<TodoItem>> {
            self.0.update(id, patch).await
        }
        async fn delete(&self, id: TodoId) -> Result<()> {
            self.0.delete(id).await
        }
        async fn clear_all(&self) -> Result<()> {
            self.0.clear_all().await?;
            self.0.set_simulate_write_error(true);
            Ok(())
        }
    }

    struct Shared(Arc<dyn StorageBackend>);

    #[async_trait]
    impl BackendFactory for Shared {
        fn kind(&self) -> BackendKind {
            BackendKind::Memory
        }

        async fn open(&self) -> Result<Arc<dyn StorageBackend>> {
            Ok(self.0.clone())
        }
    }

    fn fixed_store(backend: Arc<MemBackend>) -> (TodoStore, Arc<AtomicUsize>) {
        let opens = Arc::new(AtomicUsize::new(0));
        let selector = StorageSelector::new().with_tier(Fixed {
            backend,
            opens: opens.clone(),
            delay: Duration::from_millis(20),
        });
        (TodoStore::new(selector), opens)
    }

    async fn ready_store() -> (TodoStore, Arc<MemBackend>) {
        let backend = Arc::new(MemBackend::new());
        let (store, _) = fixed_store(backend.clone());
        store.init().await.unwrap();
        (store, backend)
    }

    async fn seed(store: &TodoStore, texts: &[&str]) -> Vec<TodoItem> {
        let mut out = Vec::new();
        for text in texts {
            out.push(store.add_todo(NewTodo::new(*text)).await.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_concurrent_init_selects_once() {
        let (store, opens) = fixed_store(Arc::new(MemBackend::new()));
        let other = store.clone();

        let (a, b) = tokio::join!(store.init(), other.init());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(store.is_ready());

        let again = store.init().await.unwrap();
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_init_loads_existing_items() {
        let seeded = vec![TodoDraft::new("from disk", 5).into_item(77)];
        let (store, _) = fixed_store(Arc::new(MemBackend::with_items(seeded)));
        store.init().await.unwrap();
        assert_eq!(store.todos().len(), 1);
        assert_eq!(store.get(77).unwrap().text, "from disk");
        assert_eq!(store.backend_kind(), Some(BackendKind::Memory));
    }

    #[tokio::test]
    async fn test_failed_init_can_be_retried() {
        let opens = Arc::new(AtomicUsize::new(0));
        let store = TodoStore::new(StorageSelector::new().with_tier(FlakyOnce {
            opens: opens.clone(),
        }));

        assert!(store.init().await.is_err());
        assert!(!store.is_ready());

        store.init().await.unwrap();
        assert!(store.is_ready());
        assert_eq!(opens.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_mutations_before_init_are_rejected() {
        let (store, _) = fixed_store(Arc::new(MemBackend::new()));
        assert_eq!(
            store.add_todo(NewTodo::new("early")).await.unwrap_err(),
            TodoError::StorageNotReady
        );
        assert_eq!(
            store.clear_completed().await.unwrap_err(),
            TodoError::StorageNotReady
        );
    }

    #[tokio::test]
    async fn test_add_normalizes_and_appends() {
        let (store, _) = ready_store().await;
        seed(&store, &["first"]).await;
        let item = store
            .add_todo(
                NewTodo::new("  second  ")
                    .with_category("  groceries ")
                    .with_priority("normal")
                    .with_due("2030-01-02"),
            )
            .await
            .unwrap();

        assert_eq!(item.text, "second");
        assert_eq!(item.category, "groceries");
        assert_eq!(item.priority, Priority::Medium);
        assert_eq!(item.due_at, parse_date_local("2030-01-02"));
        assert!(!item.completed);

        let texts: Vec<String> = store.todos().iter().map(|t| t.text.clone()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_add_rejects_blank_text() {
        let (store, backend) = ready_store().await;
        let err = store.add_todo(NewTodo::new("   ")).await.unwrap_err();
        assert!(matches!(err, TodoError::InvalidInput(_)));
        assert!(backend.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ids_are_distinct() {
        let (store, _) = ready_store().await;
        let items = seed(&store, &["a", "b", "c", "d", "e"]).await;
        let ids: HashSet<TodoId> = items.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 5);
    }

    #[tokio::test]
    async fn test_failed_add_leaves_memory_alone() {
        let (store, backend) = ready_store().await;
        seed(&store, &["a"]).await;
        backend.set_simulate_write_error(true);
        assert!(store.add_todo(NewTodo::new("b")).await.is_err());
        assert_eq!(store.todos().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_flips_and_unknown_is_none() {
        let (store, _) = ready_store().await;
        let a = seed(&store, &["a"]).await.remove(0);

        let toggled = store.toggle_todo(a.id).await.unwrap().unwrap();
        assert!(toggled.completed);
        assert!(store.get(a.id).unwrap().completed);
        assert_eq!(store.pending_count(), 0);

        assert_eq!(store.toggle_todo(9999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_round_trip() {
        let (store, backend) = ready_store().await;
        let a = store
            .add_todo(NewTodo::new("a").with_category("work").with_notes("n"))
            .await
            .unwrap();

        let edit = TodoEdit {
            text: Some("renamed".into()),
            priority: Some("urgent".into()),
            due: Some("2031-05-06".into()),
            ..Default::default()
        };
        store.update_todo(a.id, edit).await.unwrap().unwrap();

        let stored = backend.get_all().await.unwrap().remove(0);
        assert_eq!(stored.text, "renamed");
        assert_eq!(stored.priority, Priority::Urgent);
        assert_eq!(stored.due_at, parse_date_local("2031-05-06"));
        assert_eq!(stored.category, "work");
        assert_eq!(stored.notes, "n");
        assert_eq!(stored.created_at, a.created_at);
        assert_eq!(store.get(a.id).unwrap(), stored);
    }

    #[tokio::test]
    async fn test_update_missing_id_returns_none() {
        let (store, _) = ready_store().await;
        seed(&store, &["a"]).await;
        let before = store.todos();
        let result = store.update_todo(424242, TodoEdit::text("x")).await.unwrap();
        assert_eq!(result, None);
        assert_eq!(store.todos(), before);
    }

    #[tokio::test]
    async fn test_update_still_works_on_completed_items() {
        let (store, _) = ready_store().await;
        let a = seed(&store, &["a"]).await.remove(0);
        store.toggle_todo(a.id).await.unwrap();

        let updated = store
            .update_todo(a.id, TodoEdit::text("edited"))
            .await
            .unwrap()
            .unwrap();
        assert!(updated.completed);
        assert_eq!(updated.text, "edited");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, _) = ready_store().await;
        seed(&store, &["a", "b"]).await;
        let before = store.todos();
        store.delete_todo(123456).await.unwrap();
        assert_eq!(store.todos(), before);
    }

    #[tokio::test]
    async fn test_clear_completed_keeps_open_item() {
        let (store, backend) = ready_store().await;
        let items = seed(&store, &["a", "b", "c"]).await;
        store.toggle_todo(items[0].id).await.unwrap();
        store.toggle_todo(items[2].id).await.unwrap();

        assert_eq!(store.clear_completed().await.unwrap(), 2);

        let left = store.todos();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, items[1].id);
        assert_eq!(backend.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bulk_failure_leaves_memory_untouched() {
        let (store, backend) = ready_store().await;
        let items = seed(&store, &["a", "b", "c"]).await;
        for item in &items {
            store.toggle_todo(item.id).await.unwrap();
        }
        backend.fail_writes_for(items[1].id);
        let before = store.todos();

        let err = store.clear_completed().await.unwrap_err();
        assert!(matches!(err, TodoError::Persistence(_)));
        assert_eq!(store.todos(), before);

        // the other two deletes went through; refresh reconciles
        store.refresh().await.unwrap();
        assert_eq!(store.todos().len(), 1);
        assert_eq!(store.todos()[0].id, items[1].id);
    }

    #[tokio::test]
    async fn test_toggle_all_failure_leaves_memory_unchanged() {
        let (store, backend) = ready_store().await;
        let items = seed(&store, &["a", "b", "c"]).await;
        backend.fail_writes_for(items[2].id);
        let before = store.todos();

        let err = store.toggle_all().await.unwrap_err();
        assert!(matches!(err, TodoError::Persistence(_)));
        assert_eq!(store.todos(), before);
        assert!(store.todos().iter().all(|t| !t.completed));

        store.refresh().await.unwrap();
        let done: Vec<TodoId> = store
            .todos()
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.id)
            .collect();
        assert_eq!(done, vec![items[0].id, items[1].id]);
    }

    #[tokio::test]
    async fn test_replace_all_failure_then_refresh() {
        let inner = Arc::new(MemBackend::new());
        let selector =
            StorageSelector::new().with_tier(Shared(Arc::new(FailsAfterClear(inner.clone()))));
        let store = TodoStore::new(selector);
        store.init().await.unwrap();
        seed(&store, &["old 1", "old 2"]).await;
        let before = store.todos();

        let err = store
            .replace_all(vec![TodoDraft::new("new", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::Persistence(_)));
        assert_eq!(store.todos(), before);
        assert_eq!(store.todos().len(), 2);

        // the clear went through before the adds failed
        store.refresh().await.unwrap();
        assert!(store.todos().is_empty());
        assert!(inner.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_all_completes_then_reopens() {
        let (store, _) = ready_store().await;
        let items = seed(&store, &["a", "b", "c"]).await;
        store.toggle_todo(items[0].id).await.unwrap();

        let updated = store.toggle_all().await.unwrap();
        assert_eq!(updated.len(), 3);
        assert!(store.todos().iter().all(|t| t.completed));

        store.toggle_all().await.unwrap();
        assert!(store.todos().iter().all(|t| !t.completed));

        let order: Vec<TodoId> = store.todos().iter().map(|t| t.id).collect();
        assert_eq!(order, items.iter().map(|t| t.id).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_toggle_all_on_empty_list() {
        let (store, _) = ready_store().await;
        assert!(store.toggle_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_many_appends_all() {
        let (store, _) = ready_store().await;
        seed(&store, &["existing"]).await;
        let drafts = (0..10)
            .map(|i| TodoDraft::new(format!("bulk {}", i), i))
            .collect();
        let added = store.add_many(drafts).await.unwrap();
        assert_eq!(added.len(), 10);
        assert_eq!(store.todos().len(), 11);
        let ids: HashSet<TodoId> = store.todos().iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 11);
    }

    #[tokio::test]
    async fn test_replace_all_sets_exact_list() {
        let (store, backend) = ready_store().await;
        seed(&store, &["old 1", "old 2"]).await;
        let drafts = vec![TodoDraft::new("new", 1)];
        store.replace_all(drafts).await.unwrap();

        let todos = store.todos();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].text, "new");
        assert_eq!(backend.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_published_snapshots_are_immutable() {
        let (store, _) = ready_store().await;
        seed(&store, &["a"]).await;
        let mut rx = store.subscribe();
        let held = store.todos();

        store.add_todo(NewTodo::new("b")).await.unwrap();

        assert_eq!(held.len(), 1);
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.todos.len(), 2);
        assert_eq!(seen.pending_count(), 2);
        assert!(seen.ready);
    }
}
