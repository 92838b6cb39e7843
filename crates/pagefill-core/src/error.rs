//! Error types for pagefill core.

use thiserror::Error;

use crate::load::LoadDirection;

/// Errors raised while building core values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid key range: start {start} is after end {end}")]
    InvalidRange { start: i64, end: i64 },

    #[error("key range overflows i64: start {start}, len {len}")]
    RangeOverflow { start: i64, len: usize },

    #[error("{direction} requires an anchor key")]
    MissingAnchor { direction: LoadDirection },

    #[error("{direction} does not take an anchor key (got {anchor})")]
    UnexpectedAnchor { direction: LoadDirection, anchor: i64 },
}

/// Invalid paging configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("page_size must be greater than zero")]
    ZeroPageSize,

    #[error("initial_load_size ({initial_load_size}) must be at least page_size ({page_size})")]
    InitialLoadTooSmall {
        initial_load_size: usize,
        page_size: usize,
    },
}
