//! Error types for remote fills.

use pagefill_core::CoreError;
use pagefill_store::StoreError;
use thiserror::Error;

/// Errors that can occur while filling the store from the remote source.
#[derive(Debug, Error)]
pub enum FillError {
    /// The remote fetch failed before anything was written.
    #[error("remote fetch failed: {0}")]
    Remote(String),

    /// The store transaction failed and was rolled back.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The request could not be turned into a key range.
    #[error("invalid fill request: {0}")]
    InvalidRequest(#[from] CoreError),
}

/// Result type for fill operations.
pub type Result<T> = std::result::Result<T, FillError>;
