//! Item and key range types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A single row of the durable table.
///
/// Items are immutable once created and unique by key. Ordering is by key
/// ascending, which is also the order every page is served in.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Item {
    pub key: i64,
}

impl Item {
    pub const fn new(key: i64) -> Self {
        Self { key }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Item({})", self.key)
    }
}

impl From<i64> for Item {
    fn from(key: i64) -> Self {
        Self::new(key)
    }
}

/// A half-open range of keys `[start, end)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: i64,
    pub end: i64,
}

impl KeyRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: i64, end: i64) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The block of `size` keys that follows `count` existing items.
    ///
    /// With dense keys starting at zero this is `[count, count + size)`.
    pub fn following(count: u64, size: usize) -> Result<Self, CoreError> {
        let start = i64::try_from(count).map_err(|_| CoreError::RangeOverflow {
            start: i64::MAX,
            len: size,
        })?;
        let end = i64::try_from(size)
            .ok()
            .and_then(|len| start.checked_add(len))
            .ok_or(CoreError::RangeOverflow { start, len: size })?;
        Ok(Self { start, end })
    }

    /// Number of keys in the range.
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, key: i64) -> bool {
        key >= self.start && key < self.end
    }

    /// One item per key, ascending.
    pub fn items(&self) -> Vec<Item> {
        (self.start..self.end).map(Item::new).collect()
    }
}

impl fmt::Debug for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyRange({}..{})", self.start, self.end)
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_following_starts_at_count() {
        let range = KeyRange::following(30, 30).unwrap();
        assert_eq!(range.start, 30);
        assert_eq!(range.end, 60);
        assert_eq!(range.len(), 30);
        assert!(range.contains(59));
        assert!(!range.contains(60));
    }

    #[test]
    fn test_items_are_dense_and_ordered() {
        let items = KeyRange::new(0, 5).unwrap().items();
        let keys: Vec<i64> = items.iter().map(|i| i.key).collect();
        assert_eq!(keys, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert_eq!(
            KeyRange::new(5, 1),
            Err(CoreError::InvalidRange { start: 5, end: 1 })
        );
    }

    #[test]
    fn test_following_overflow() {
        assert!(KeyRange::following(i64::MAX as u64, 1).is_err());
        assert!(KeyRange::following(u64::MAX, 1).is_err());
    }

    #[test]
    fn test_empty_range() {
        let range = KeyRange::following(7, 0).unwrap();
        assert!(range.is_empty());
        assert!(range.items().is_empty());
    }

    proptest! {
        #[test]
        fn following_len_matches_size(count in 0u64..1_000_000, size in 0usize..10_000) {
            let range = KeyRange::following(count, size).unwrap();
            prop_assert_eq!(range.len(), size);
            prop_assert_eq!(range.items().len(), size);
            prop_assert_eq!(range.start as u64, count);
        }
    }
}
