//! Page source: ordered, read-only pages over the durable store.

use std::sync::Arc;

use pagefill_core::{Item, PageRequest};
use pagefill_store::{Result, Store};

/// Serves pages of items from the store, starting at any key.
///
/// Never mutates the store. Used by the pager to materialize snapshots and
/// by consumers that want to read a window directly.
pub struct PageSource<S: Store> {
    store: Arc<S>,
}

impl<S: Store> PageSource<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Up to `page_size` items from `anchor` (or the first key) onwards, ascending.
    pub async fn read(&self, anchor: Option<i64>, page_size: usize) -> Result<Vec<Item>> {
        self.read_request(&PageRequest {
            anchor,
            page_size,
        })
        .await
    }

    pub async fn read_request(&self, request: &PageRequest) -> Result<Vec<Item>> {
        if request.page_size == 0 {
            return Ok(Vec::new());
        }
        self.store
            .query_range(request.start_key(), request.page_size)
            .await
    }

    /// Total committed items.
    pub async fn len(&self) -> Result<u64> {
        self.store.count().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

impl<S: Store> Clone for PageSource<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagefill_store::MemoryStore;

    fn source(keys: std::ops::Range<i64>) -> PageSource<MemoryStore> {
        PageSource::new(Arc::new(MemoryStore::with_items(keys.map(Item::new))))
    }

    fn keys(items: &[Item]) -> Vec<i64> {
        items.iter().map(|i| i.key).collect()
    }

    #[tokio::test]
    async fn test_read_from_start() {
        let source = source(0..30);
        let page = source.read(None, 10).await.unwrap();
        assert_eq!(keys(&page), (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_read_from_anchor_in_the_middle() {
        let source = source(0..30);
        let page = source.read(Some(25), 10).await.unwrap();
        assert_eq!(keys(&page), vec![25, 26, 27, 28, 29]);
    }

    #[tokio::test]
    async fn test_sparse_keys_start_at_next_key() {
        let source = PageSource::new(Arc::new(MemoryStore::with_items(
            [2, 4, 8, 16].into_iter().map(Item::new),
        )));
        let page = source.read(Some(5), 2).await.unwrap();
        assert_eq!(keys(&page), vec![8, 16]);
    }

    #[tokio::test]
    async fn test_zero_page_size_is_empty() {
        let source = source(0..30);
        assert!(source.read(None, 0).await.unwrap().is_empty());
        assert_eq!(source.len().await.unwrap(), 30);
        assert!(!source.is_empty().await.unwrap());
    }
}
