//! Tier selection: a first-success chain over fallible backend constructors.
//!
//! Each tier is a [`BackendFactory`]. [`StorageSelector::select`] tries them in
//! order, logs and swallows every construction failure, and ends with an
//! in-memory backend that cannot fail. Adding a tier means pushing another factory;
//! no caller changes.

use super::kv::KvBackend;
use super::memory::MemBackend;
use super::sqlite::SqliteBackend;
use super::{BackendKind, StorageBackend};
use crate::config::TodozConfig;
use crate::error::{Result, TodoError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// A fallible constructor for one storage tier.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn open(&self) -> Result<Arc<dyn StorageBackend>>;
}

/// SQLite file tier. `None` path means the capability is switched off.
pub struct DatabaseFactory {
    path: Option<PathBuf>,
}

impl DatabaseFactory {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl BackendFactory for DatabaseFactory {
    fn kind(&self) -> BackendKind {
        BackendKind::Database
    }

    async fn open(&self) -> Result<Arc<dyn StorageBackend>> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| TodoError::StorageUnavailable("database tier disabled".to_string()))?;
        let backend = tokio::task::spawn_blocking(move || SqliteBackend::open(&path))
            .await
            .map_err(|e| TodoError::StorageUnavailable(e.to_string()))??;
        Ok(Arc::new(backend))
    }
}

/// JSON slot tier. `None` dir means the capability is switched off.
pub struct KeyValueFactory {
    dir: Option<PathBuf>,
    key: String,
}

impl KeyValueFactory {
    pub fn new(dir: Option<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            dir,
            key: key.into(),
        }
    }
}

#[async_trait]
impl BackendFactory for KeyValueFactory {
    fn kind(&self) -> BackendKind {
        BackendKind::KeyValue
    }

    async fn open(&self) -> Result<Arc<dyn StorageBackend>> {
        let dir = self
            .dir
            .clone()
            .ok_or_else(|| TodoError::StorageUnavailable("key-value tier disabled".to_string()))?;
        Ok(Arc::new(KvBackend::open(dir, self.key.clone())?))
    }
}

/// Ordered chain of tiers with an in-memory terminal fallback.
#[derive(Default)]
pub struct StorageSelector {
    tiers: Vec<Box<dyn BackendFactory>>,
}

impl StorageSelector {
    /// An empty chain: `select` always yields the in-memory tier.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tier(mut self, factory: impl BackendFactory + 'static) -> Self {
        self.tiers.push(Box::new(factory));
        self
    }

    /// Database, then key-value, as enabled in `config`.
    pub fn from_config(config: &TodozConfig) -> Self {
        Self::new()
            .with_tier(DatabaseFactory::new(config.database_path()))
            .with_tier(KeyValueFactory::new(
                config.key_value_dir(),
                config.key_value_slot.clone(),
            ))
    }

    pub fn tier_kinds(&self) -> Vec<BackendKind> {
        self.tiers.iter().map(|t| t.kind()).collect()
    }

    /// Returns the first tier that opens. Never fails.
    pub async fn select(&self) -> Arc<dyn StorageBackend> {
        for tier in &self.tiers {
            match tier.open().await {
                Ok(backend) => {
                    debug!(backend = %backend.kind(), "storage tier selected");
                    return backend;
                }
                Err(e) => {
                    warn!(tier = %tier.kind(), error = %e, "storage tier unavailable, falling back");
                }
            }
        }
        debug!(backend = %BackendKind::Memory, "storage tier selected");
        Arc::new(MemBackend::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct Failing {
        kind: BackendKind,
        attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BackendFactory for Failing {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        async fn open(&self) -> Result<Arc<dyn StorageBackend>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(TodoError::StorageUnavailable("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_database_failure_falls_back_to_key_value() {
        let dir = tempdir().unwrap();
        let attempts = Arc::new(AtomicUsize::new(0));
        let selector = StorageSelector::new()
            .with_tier(Failing {
                kind: BackendKind::Database,
                attempts: attempts.clone(),
            })
            .with_tier(KeyValueFactory::new(Some(dir.path().to_path_buf()), "todos_local"));

        let backend = selector.select().await;
        assert_eq!(backend.kind(), BackendKind::KeyValue);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_tiers_failing_yields_memory() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let selector = StorageSelector::new()
            .with_tier(Failing {
                kind: BackendKind::Database,
                attempts: attempts.clone(),
            })
            .with_tier(Failing {
                kind: BackendKind::KeyValue,
                attempts: attempts.clone(),
            });

        let backend = selector.select().await;
        assert_eq!(backend.kind(), BackendKind::Memory);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_success_stops_the_chain() {
        let dir = tempdir().unwrap();
        let attempts = Arc::new(AtomicUsize::new(0));
        let selector = StorageSelector::new()
            .with_tier(DatabaseFactory::new(Some(dir.path().join("todoDB.sqlite3"))))
            .with_tier(Failing {
                kind: BackendKind::KeyValue,
                attempts: attempts.clone(),
            });

        assert_eq!(selector.select().await.kind(), BackendKind::Database);
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disabled_tiers_are_skipped() {
        let selector = StorageSelector::new()
            .with_tier(DatabaseFactory::new(None))
            .with_tier(KeyValueFactory::new(None, "todos_local"));
        assert_eq!(selector.select().await.kind(), BackendKind::Memory);
    }

    #[test]
    fn test_tier_kinds_in_order() {
        let selector = StorageSelector::new()
            .with_tier(DatabaseFactory::new(None))
            .with_tier(KeyValueFactory::new(None, "x"));
        assert_eq!(
            selector.tier_kinds(),
            vec![BackendKind::Database, BackendKind::KeyValue]
        );
    }
}
