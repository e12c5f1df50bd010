//! # Storage Layer
//!
//! Every persistence tier implements one contract, [`StorageBackend`]. The rest of
//! the crate never knows which tier it is talking to, apart from the diagnostic
//! [`BackendKind`] tag.
//!
//! ## Tiers
//!
//! In preference order:
//!
//! 1. [`sqlite::SqliteBackend`]: embedded database, one `todos` table with an
//!    auto-increment key. Each call runs in its own transaction; `update` does its
//!    get/merge/put inside one transaction.
//! 2. [`kv::KvBackend`]: the whole list serialized as JSON into one named slot
//!    (`<data dir>/<slot>.json`). Every mutation rewrites the slot atomically.
//! 3. [`memory::MemBackend`]: a process-local list. Cannot fail to open; used as
//!    the terminal fallback and in tests.
//!
//! ```text
//!            StorageSelector::select()
//!                      │
//!        ┌─────────────┼──────────────┐
//!        ▼ (ok?)       ▼ (ok?)        ▼
//!   SqliteBackend   KvBackend     MemBackend
//!        └─────────────┴──────────────┘
//!                      │  Arc<dyn StorageBackend>
//!                      ▼
//!                  TodoStore
//! ```
//!
//! ## Contract
//!
//! - `get_all` returns every record in no particular order.
//! - `add` assigns a fresh unique id and returns the stored record.
//! - `update` merges a patch and returns the merged record, or `Ok(None)` when the
//!   id does not exist.
//! - `delete` of a missing id is not an error.
//! - `clear_all` removes every record.
//!
//! Write failures surface as [`TodoError::Persistence`](crate::error::TodoError)
//! and are never retried here.

use crate::error::Result;
use crate::model::{TodoDraft, TodoId, TodoItem, TodoPatch};
use async_trait::async_trait;
use std::fmt;

pub mod ids;
pub mod kv;
pub mod memory;
pub mod selector;
pub mod sqlite;
pub mod todo_store;

pub use selector::{BackendFactory, StorageSelector};
pub use todo_store::{TodoSnapshot, TodoStore};

/// Which tier is active. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Database,
    KeyValue,
    Memory,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Database => "database",
            BackendKind::KeyValue => "key-value",
            BackendKind::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The storage contract shared by every tier.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Every stored record, unordered.
    async fn get_all(&self) -> Result<Vec<TodoItem>>;

    /// Persist a draft under a freshly assigned id.
    async fn add(&self, draft: TodoDraft) -> Result<TodoItem>;

    /// Merge `patch` into the record `id`. `Ok(None)` if there is no such record.
    async fn update(&self, id: TodoId, patch: TodoPatch) -> Result<Option<TodoItem>>;

    /// Remove `id` if present.
    async fn delete(&self, id: TodoId) -> Result<()>;

    async fn clear_all(&self) -> Result<()>;
}
