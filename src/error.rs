// chaintrack/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Caller supplied a value violating a precondition (bad date, reorder
    /// with a mismatched name set, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Operation referenced a chain or item that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Create/rename target collides with an existing name.
    #[error("name conflict: '{0}' already exists")]
    NameConflict(String),

    /// Backing file exists but fails to parse. Fatal to store initialization;
    /// never silently reset to defaults.
    #[error("corrupt data file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}
