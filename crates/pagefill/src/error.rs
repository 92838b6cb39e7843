//! Error types for the pager.

use pagefill_core::{ConfigError, CoreError, LoadDirection};
use pagefill_remote::FillError;
use pagefill_store::StoreError;
use thiserror::Error;

/// Errors that can occur during pager operations.
#[derive(Debug, Error)]
pub enum PagerError {
    /// Malformed direction/anchor combination. Rejected before any I/O.
    #[error("invalid request: {0}")]
    InvalidRequest(#[source] CoreError),

    /// Invalid paging configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The store transaction could not commit and was rolled back.
    #[error("{direction} transaction failed: {source}")]
    TransactionFailure {
        direction: LoadDirection,
        source: StoreError,
    },

    /// The remote fetch failed before reaching the store.
    #[error("{direction} remote fetch failed: {message}")]
    RemoteFailure {
        direction: LoadDirection,
        message: String,
    },

    /// The background fill task panicked or was cancelled by the runtime.
    #[error("{direction} fill task failed: {message}")]
    TaskFailed {
        direction: LoadDirection,
        message: String,
    },
}

impl PagerError {
    /// Map a filler error onto the pager taxonomy.
    pub fn from_fill(direction: LoadDirection, err: FillError) -> Self {
        match err {
            FillError::Remote(message) => PagerError::RemoteFailure { direction, message },
            FillError::Store(source) => PagerError::TransactionFailure { direction, source },
            FillError::InvalidRequest(e) => PagerError::InvalidRequest(e),
        }
    }

    /// Whether a later `request()` for the same direction may succeed unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PagerError::TransactionFailure { .. }
                | PagerError::RemoteFailure { .. }
                | PagerError::TaskFailed { .. }
        )
    }

    /// The direction the error belongs to, if any.
    pub fn direction(&self) -> Option<LoadDirection> {
        match self {
            PagerError::TransactionFailure { direction, .. }
            | PagerError::RemoteFailure { direction, .. }
            | PagerError::TaskFailed { direction, .. } => Some(*direction),
            PagerError::InvalidRequest(_) | PagerError::Config(_) => None,
        }
    }
}

/// Result type for pager operations.
pub type Result<T> = std::result::Result<T, PagerError>;
