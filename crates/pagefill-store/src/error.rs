//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A key is already present in the table or earlier in the same transaction.
    #[error("duplicate key: {0}")]
    DuplicateKey(i64),

    /// The write no longer matches the table it was computed against.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The transaction was aborted and rolled back.
    #[error("transaction aborted: {0}")]
    Aborted(String),

    /// The transaction was already committed or rolled back.
    #[error("transaction already finished")]
    TransactionClosed,

    /// A lock guarding the table was poisoned.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// Background task running blocking I/O failed.
    #[error("blocking task failed: {0}")]
    Task(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
