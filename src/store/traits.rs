//! Storage traits and error types
//!
//! This module defines the trait interface for table backends and
//! associated error types.

use crate::store::{IdentityStrategy, PersistedTable};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or writing a persisted table
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Table {path} is missing column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A backend holding one persisted table
///
/// Tables are only ever replaced whole: `save` must either leave the old
/// table in place or swap in the new one, never a partial write.
pub trait TableStore: Send + Sync {
    /// Identity strategy of the rows this store holds
    fn identity(&self) -> IdentityStrategy;

    /// Loads the table; a missing table is empty
    fn load(&self) -> StoreResult<PersistedTable>;

    /// Replaces the stored table with `table`
    fn save(&self, table: &PersistedTable) -> StoreResult<()>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}
