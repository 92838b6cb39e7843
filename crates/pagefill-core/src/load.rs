//! Load directions, per-direction state, and request/result values.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Which end of the dataset a load extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadDirection {
    /// Replace the whole dataset.
    Refresh,
    /// Extend the dataset before its first key.
    Prepend,
    /// Extend the dataset after its last key.
    Append,
}

impl LoadDirection {
    pub const ALL: [LoadDirection; 3] = [
        LoadDirection::Refresh,
        LoadDirection::Prepend,
        LoadDirection::Append,
    ];

    /// Prepend and Append are relative to a boundary key; Refresh is not.
    pub fn requires_anchor(self) -> bool {
        !matches!(self, LoadDirection::Refresh)
    }

    /// Check the anchor against this direction.
    pub fn check_anchor(self, anchor: Option<i64>) -> Result<(), CoreError> {
        match (self.requires_anchor(), anchor) {
            (true, None) => Err(CoreError::MissingAnchor { direction: self }),
            (false, Some(anchor)) => Err(CoreError::UnexpectedAnchor {
                direction: self,
                anchor,
            }),
            _ => Ok(()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoadDirection::Refresh => "refresh",
            LoadDirection::Prepend => "prepend",
            LoadDirection::Append => "append",
        }
    }
}

impl fmt::Display for LoadDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadState {
    /// Idle; a request may start a fill.
    #[default]
    NotLoading,
    /// A fill is in flight; further requests are coalesced.
    Loading,
    /// No more data exists in this direction.
    Done,
}

impl LoadState {
    pub fn is_loading(self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_done(self) -> bool {
        matches!(self, LoadState::Done)
    }
}

/// A consumer's request for a window of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// First key of the window; `None` means the first key in the store.
    pub anchor: Option<i64>,
    /// Maximum number of items in the window.
    pub page_size: usize,
}

impl PageRequest {
    pub fn from_start(page_size: usize) -> Self {
        Self {
            anchor: None,
            page_size,
        }
    }

    pub fn at(anchor: i64, page_size: usize) -> Self {
        Self {
            anchor: Some(anchor),
            page_size,
        }
    }

    /// The key to start reading from.
    pub fn start_key(&self) -> i64 {
        self.anchor.unwrap_or(i64::MIN)
    }
}

/// Outcome of a remote fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillResult {
    /// Whether the remote source has data beyond what was just written.
    pub more_data_available: bool,
    /// Items inserted by the fill's transaction.
    pub written: usize,
}

impl FillResult {
    pub const fn more(written: usize) -> Self {
        Self {
            more_data_available: true,
            written,
        }
    }

    pub const fn exhausted(written: usize) -> Self {
        Self {
            more_data_available: false,
            written,
        }
    }
}
