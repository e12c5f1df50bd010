use crate::model::TodoId;
use thiserror::Error;

/// Errors surfaced by the todo core.
///
/// Every variant carries owned, cloneable data so a single initialization
/// outcome can be handed to each caller that awaited it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    #[error("No storage backend is available: {0}")]
    StorageUnavailable(String),

    #[error("Storage is not ready yet")]
    StorageNotReady,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("{0}")]
    ImportFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Todo {0} is completed and cannot be changed")]
    Locked(TodoId),

    #[error("Busy: {0}")]
    Busy(String),

    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

impl From<std::io::Error> for TodoError {
    fn from(err: std::io::Error) -> Self {
        TodoError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for TodoError {
    fn from(err: serde_json::Error) -> Self {
        TodoError::Persistence(format!("serialization failed: {}", err))
    }
}

impl From<rusqlite::Error> for TodoError {
    fn from(err: rusqlite::Error) -> Self {
        TodoError::Persistence(format!("database error: {}", err))
    }
}

impl From<confique::Error> for TodoError {
    fn from(err: confique::Error) -> Self {
        TodoError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TodoError>;
