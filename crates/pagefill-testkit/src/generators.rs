//! Proptest generators for property-based testing.

use proptest::prelude::*;

use pagefill_core::{Item, KeyRange, LoadDirection, PagingConfig};

use crate::scenarios::Step;

/// Generate a LoadDirection.
pub fn direction() -> impl Strategy<Value = LoadDirection> {
    prop_oneof![
        Just(LoadDirection::Refresh),
        Just(LoadDirection::Prepend),
        Just(LoadDirection::Append),
    ]
}

/// Generate a valid paging configuration with small pages.
pub fn paging_config() -> impl Strategy<Value = PagingConfig> {
    (1usize..=20, 0usize..=4, 0usize..=2, any::<bool>()).prop_map(
        |(page_size, prefetch, extra_pages, placeholders)| {
            PagingConfig::with_page_size(page_size)
                .prefetch_distance(prefetch)
                .initial_load_size(page_size * (1 + extra_pages))
                .placeholders(placeholders)
        },
    )
}

/// Generate a remote dataset bound. `None` is unbounded.
pub fn max_items() -> impl Strategy<Value = Option<u64>> {
    prop_oneof![Just(None), (0u64..=100).prop_map(Some)]
}

/// Generate a single step, faults included.
pub fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Append),
        2 => Just(Step::Refresh),
        1 => Just(Step::Prepend),
        1 => Just(Step::FailRemote),
        1 => Just(Step::FailMidTransaction),
    ]
}

/// Generate a step sequence of at most `max_len` steps.
pub fn steps(max_len: usize) -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(step(), 0..=max_len)
}

/// Generate a non-empty key range that does not overflow.
pub fn key_range() -> impl Strategy<Value = KeyRange> {
    (-1_000i64..1_000, 1i64..=200).prop_map(|(start, len)| KeyRange {
        start,
        end: start + len,
    })
}

/// Generate a sorted batch of distinct items.
pub fn items(max_len: usize) -> impl Strategy<Value = Vec<Item>> {
    prop::collection::btree_set(any::<i64>(), 0..=max_len)
        .prop_map(|keys| keys.into_iter().map(Item::new).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_configs_are_valid(config in paging_config()) {
            prop_assert!(config.validate().is_ok());
            prop_assert!(config.initial_load_size >= config.page_size);
        }

        #[test]
        fn generated_ranges_are_non_empty(range in key_range()) {
            prop_assert!(!range.is_empty());
            prop_assert!(range.len() <= 200);
        }

        #[test]
        fn generated_items_are_ascending(items in items(50)) {
            prop_assert!(items.windows(2).all(|w| w[0].key < w[1].key));
        }
    }
}
