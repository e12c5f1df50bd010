use super::ids::{max_id, IdGenerator};
use super::{BackendKind, StorageBackend};
use crate::error::{Result, TodoError};
use crate::model::{TodoDraft, TodoId, TodoItem, TodoPatch};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Key-value tier: the whole list lives as one JSON array in `<dir>/<key>.json`.
///
/// Every mutation is read-modify-write of the full list, performed while holding
/// the slot lock so concurrent bulk calls cannot drop each other's writes. The
/// slot is replaced atomically (temp file + rename).
pub struct KvBackend {
    dir: PathBuf,
    key: String,
    ids: Mutex<IdGenerator>,
}

impl KvBackend {
    /// Opens the slot, creating `dir` if needed.
    ///
    /// Fails if the directory is not writable or the slot holds something that is
    /// not a todo list, so the selector can fall through without overwriting it.
    pub fn open(dir: impl Into<PathBuf>, key: impl Into<String>) -> Result<Self> {
        let backend = Self {
            dir: dir.into(),
            key: key.into(),
            ids: Mutex::new(IdGenerator::new()),
        };
        fs::create_dir_all(&backend.dir)?;
        backend.probe_writable()?;
        backend.read_slot()?;
        Ok(backend)
    }

    pub fn slot_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }

    fn probe_writable(&self) -> Result<()> {
        let probe = self.tmp_path();
        fs::write(&probe, b"[]")?;
        fs::remove_file(&probe)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        self.dir.join(format!(".{}-{}.tmp", self.key, Uuid::new_v4()))
    }

    fn read_slot(&self) -> Result<Vec<TodoItem>> {
        read_list(&self.slot_path())
    }

    fn write_slot(&self, items: &[TodoItem]) -> Result<()> {
        let content = serde_json::to_string(items)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, content)?;
        fs::rename(&tmp, self.slot_path())?;
        Ok(())
    }
}

fn read_list(path: &Path) -> Result<Vec<TodoItem>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content).map_err(|e| {
        TodoError::Persistence(format!("unreadable slot {}: {}", path.display(), e))
    })
}

#[async_trait]
impl StorageBackend for KvBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::KeyValue
    }

    async fn get_all(&self) -> Result<Vec<TodoItem>> {
        let _guard = self.ids.lock().await;
        self.read_slot()
    }

    async fn add(&self, draft: TodoDraft) -> Result<TodoItem> {
        let mut ids = self.ids.lock().await;
        let mut items = self.read_slot()?;
        let id = ids.next(max_id(items.iter().map(|t| &t.id)));
        let item = draft.into_item(id);
        items.push(item.clone());
        self.write_slot(&items)?;
        Ok(item)
    }

    async fn update(&self, id: TodoId, patch: TodoPatch) -> Result<Option<TodoItem>> {
        let _guard = self.ids.lock().await;
        let mut items = self.read_slot()?;
        let merged = match items.iter_mut().find(|t| t.id == id) {
            Some(item) => {
                patch.apply(item);
                item.clone()
            }
            None => return Ok(None),
        };
        self.write_slot(&items)?;
        Ok(Some(merged))
    }

    async fn delete(&self, id: TodoId) -> Result<()> {
        let _guard = self.ids.lock().await;
        let mut items = self.read_slot()?;
        let before = items.len();
        items.retain(|t| t.id != id);
        if items.len() != before {
            self.write_slot(&items)?;
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        let _guard = self.ids.lock().await;
        self.write_slot(&[])
    }
}
