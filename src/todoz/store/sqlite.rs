use super::{BackendKind, StorageBackend};
use crate::error::{Result, TodoError};
use crate::model::{Priority, TodoDraft, TodoId, TodoItem, TodoPatch};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::Path;
use tokio::sync::Mutex;

const SCHEMA_VERSION: i64 = 1;

const SELECT_COLUMNS: &str =
    "SELECT id, text, category, due_at, priority, completed, created_at, notes FROM todos";

/// Structured-database tier backed by SQLite.
///
/// One `todos` table keyed by an auto-increment id. Each contract call is one
/// statement or one transaction, serialized through the connection lock.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

/// Creates the store on first open. A file written by a newer schema is refused
/// rather than guessed at.
fn migrate(conn: &Connection) -> Result<()> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version > SCHEMA_VERSION {
        return Err(TodoError::Persistence(format!(
            "database schema version {} is newer than supported version {}",
            version, SCHEMA_VERSION
        )));
    }
    if version < SCHEMA_VERSION {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '',
                due_at INTEGER,
                priority TEXT NOT NULL DEFAULT 'medium',
                completed INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                notes TEXT NOT NULL DEFAULT ''
            );",
        )?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<TodoItem> {
    let priority: String = row.get(4)?;
    Ok(TodoItem {
        id: row.get(0)?,
        text: row.get(1)?,
        category: row.get(2)?,
        due_at: row.get(3)?,
        priority: Priority::normalize(&priority),
        completed: row.get(5)?,
        created_at: row.get(6)?,
        notes: row.get(7)?,
    })
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Database
    }

    async fn get_all(&self) -> Result<Vec<TodoItem>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_COLUMNS))?;
        let rows = stmt.query_map([], row_to_item)?;
        let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    async fn add(&self, draft: TodoDraft) -> Result<TodoItem> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO todos (text, category, due_at, priority, completed, created_at, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                draft.text,
                draft.category,
                draft.due_at,
                draft.priority.as_str(),
                draft.completed,
                draft.created_at,
                draft.notes
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(draft.into_item(id))
    }

    async fn update(&self, id: TodoId, patch: TodoPatch) -> Result<Option<TodoItem>> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let existing = tx
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                row_to_item,
            )
            .optional()?;
        let Some(mut item) = existing else {
            return Ok(None);
        };
        patch.apply(&mut item);
        tx.execute(
            "UPDATE todos SET text = ?2, category = ?3, due_at = ?4, priority = ?5,
                completed = ?6, notes = ?7
             WHERE id = ?1",
            params![
                item.id,
                item.text,
                item.category,
                item.due_at,
                item.priority.as_str(),
                item.completed,
                item.notes
            ],
        )?;
        tx.commit()?;
        Ok(Some(item))
    }

    async fn delete(&self, id: TodoId) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM todos WHERE id = ?1", params![id])?;
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM todos", [])?;
        Ok(())
    }
}
