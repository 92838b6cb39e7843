//! Page snapshots published to subscribers.

use pagefill_core::{Item, LoadDirection, LoadState, PageRequest};

use crate::error::PagerError;

/// A recoverable load error reported alongside the last good items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub message: String,
    pub retryable: bool,
}

impl From<&PagerError> for LoadFailure {
    fn from(err: &PagerError) -> Self {
        Self {
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// State and last error of one direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectionStatus {
    pub state: LoadState,
    pub error: Option<LoadFailure>,
}

/// Status of all three directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStates {
    pub refresh: DirectionStatus,
    pub prepend: DirectionStatus,
    pub append: DirectionStatus,
}

impl LoadStates {
    pub fn get(&self, direction: LoadDirection) -> &DirectionStatus {
        match direction {
            LoadDirection::Refresh => &self.refresh,
            LoadDirection::Prepend => &self.prepend,
            LoadDirection::Append => &self.append,
        }
    }

    pub fn state(&self, direction: LoadDirection) -> LoadState {
        self.get(direction).state
    }

    pub fn error(&self, direction: LoadDirection) -> Option<&LoadFailure> {
        self.get(direction).error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        LoadDirection::ALL
            .iter()
            .any(|d| self.state(*d).is_loading())
    }
}

/// One rendered slot of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Loaded(Item),
    /// A slot in the window with no item behind it yet.
    Placeholder,
}

/// The items currently visible for the consumer's window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    /// Items in the window, ascending by key.
    pub items: Vec<Item>,
    /// The window these items were read for.
    pub window: PageRequest,
    pub load_states: LoadStates,
    pub placeholders_enabled: bool,
    /// Bumped on every publication.
    pub generation: u64,
}

impl PageSnapshot {
    pub fn empty(window: PageRequest, placeholders_enabled: bool) -> Self {
        Self {
            items: Vec::new(),
            window,
            load_states: LoadStates::default(),
            placeholders_enabled,
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> Vec<i64> {
        self.items.iter().map(|item| item.key).collect()
    }

    pub fn first_key(&self) -> Option<i64> {
        self.items.first().map(|item| item.key)
    }

    pub fn last_key(&self) -> Option<i64> {
        self.items.last().map(|item| item.key)
    }

    /// Rows to render. With placeholders enabled, unresolved slots up to
    /// the window size are padded with [`Row::Placeholder`].
    pub fn rows(&self) -> Vec<Row> {
        let mut rows: Vec<Row> = self.items.iter().copied().map(Row::Loaded).collect();
        if self.placeholders_enabled && rows.len() < self.window.page_size {
            rows.resize(self.window.page_size, Row::Placeholder);
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(keys: std::ops::Range<i64>, window: usize, placeholders: bool) -> PageSnapshot {
        PageSnapshot {
            items: keys.map(Item::new).collect(),
            ..PageSnapshot::empty(PageRequest::from_start(window), placeholders)
        }
    }

    #[test]
    fn test_rows_without_placeholders() {
        let snap = snapshot(0..3, 10, false);
        assert_eq!(snap.rows().len(), 3);
        assert!(snap.rows().iter().all(|r| matches!(r, Row::Loaded(_))));
    }

    #[test]
    fn test_rows_padded_with_placeholders() {
        let snap = snapshot(0..3, 5, true);
        let rows = snap.rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[2], Row::Loaded(Item::new(2)));
        assert_eq!(rows[3], Row::Placeholder);
        assert_eq!(rows[4], Row::Placeholder);
    }

    #[test]
    fn test_full_window_has_no_placeholders() {
        let snap = snapshot(0..5, 5, true);
        assert!(!snap.rows().contains(&Row::Placeholder));
        assert_eq!(snap.first_key(), Some(0));
        assert_eq!(snap.last_key(), Some(4));
    }

    #[test]
    fn test_load_states_lookup() {
        let mut states = LoadStates::default();
        states.append.state = LoadState::Loading;
        assert!(states.is_loading());
        assert_eq!(states.state(LoadDirection::Append), LoadState::Loading);
        assert_eq!(states.state(LoadDirection::Refresh), LoadState::NotLoading);
        assert!(states.error(LoadDirection::Append).is_none());
    }

    proptest::proptest! {
        #[test]
        fn rows_cover_window_when_padded(loaded in 0i64..40, window in 0usize..40) {
            let padded = snapshot(0..loaded, window, true).rows();
            proptest::prop_assert_eq!(padded.len(), window.max(loaded as usize));

            let plain = snapshot(0..loaded, window, false).rows();
            proptest::prop_assert_eq!(plain.len(), loaded as usize);
        }
    }
}
