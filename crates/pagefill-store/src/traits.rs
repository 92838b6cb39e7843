//! Store and Transaction traits: the abstract interface for the item table.
//!
//! This lets the pager and the remote filler stay storage-agnostic.
//! Implementations include SQLite (persistent) and in-memory (tests, demo).

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use pagefill_core::Item;

use crate::error::{Result, StoreError};

/// The Store trait: committed reads plus transactional writes.
///
/// All methods are async to support both blocking (SQLite) and in-memory
/// backends. For SQLite, blocking work runs on `spawn_blocking`.
///
/// # Design Notes
///
/// - **Snapshot reads**: `query_range` and `count` only see committed data.
/// - **Serialized writers**: at most one [`Transaction`] is open at a time;
///   `begin_transaction` waits for the current holder to finish.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transaction. Waits until no other transaction is open.
    async fn begin_transaction<'a>(&'a self) -> Result<Box<dyn Transaction + 'a>>;

    /// Get up to `limit` items with `key >= start_key`, ordered by key.
    async fn query_range(&self, start_key: i64, limit: usize) -> Result<Vec<Item>>;

    /// Number of committed items.
    async fn count(&self) -> Result<u64>;

    /// Highest committed key, if any.
    async fn last_key(&self) -> Result<Option<i64>>;
}

/// A write transaction against a [`Store`].
///
/// Writes are staged and become visible together on [`commit`](Transaction::commit).
/// Dropping a transaction without committing rolls it back.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Stage deletion of every item.
    async fn delete_all(&mut self) -> Result<()>;

    /// Stage insertion of `items`.
    ///
    /// Fails with `DuplicateKey` if any key is already visible to this
    /// transaction or repeated within the batch. A failing batch stages nothing.
    async fn insert_many(&mut self, items: &[Item]) -> Result<()>;

    /// Item count as seen from inside this transaction.
    async fn count(&self) -> Result<u64>;

    /// Apply all staged writes atomically.
    async fn commit(&mut self) -> Result<()>;

    /// Discard all staged writes.
    async fn rollback(&mut self) -> Result<()>;
}

/// Writes staged by a transaction, shared by both backends.
#[derive(Debug, Default, Clone)]
pub struct WriteSet {
    cleared: bool,
    inserts: BTreeMap<i64, Item>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a delete-all. Earlier staged inserts are dropped with it.
    pub fn clear(&mut self) {
        self.cleared = true;
        self.inserts.clear();
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    pub fn is_empty(&self) -> bool {
        !self.cleared && self.inserts.is_empty()
    }

    /// Staged inserts, ordered by key.
    pub fn inserts(&self) -> impl Iterator<Item = &Item> {
        self.inserts.values()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.len()
    }

    /// Stage a batch of inserts.
    ///
    /// `committed` reports whether a key exists in the committed table; it is
    /// ignored once the transaction has staged a delete-all.
    pub fn stage(&mut self, items: &[Item], committed: impl Fn(i64) -> bool) -> Result<()> {
        let mut batch = BTreeSet::new();
        for item in items {
            if !batch.insert(item.key)
                || self.inserts.contains_key(&item.key)
                || (!self.cleared && committed(item.key))
            {
                return Err(StoreError::DuplicateKey(item.key));
            }
        }
        self.inserts.extend(items.iter().map(|item| (item.key, *item)));
        Ok(())
    }

    /// Count visible inside the transaction, given the committed count.
    pub fn visible_count(&self, committed: u64) -> u64 {
        let base = if self.cleared { 0 } else { committed };
        base + self.inserts.len() as u64
    }
}

/// Extension trait for common write patterns.
pub trait StoreExt: Store {
    /// Delete everything and insert `items` as one transaction.
    fn replace_all(&self, items: &[Item]) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Insert `items` as one transaction.
    fn append(&self, items: &[Item]) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn replace_all(&self, items: &[Item]) -> Result<()> {
        let mut tx = self.begin_transaction().await?;
        tx.delete_all().await?;
        tx.insert_many(items).await?;
        tx.commit().await
    }

    async fn append(&self, items: &[Item]) -> Result<()> {
        let mut tx = self.begin_transaction().await?;
        tx.insert_many(items).await?;
        tx.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(keys: &[i64]) -> Vec<Item> {
        keys.iter().copied().map(Item::new).collect()
    }

    #[test]
    fn test_stage_rejects_committed_key() {
        let mut writes = WriteSet::new();
        let err = writes.stage(&items(&[1, 2]), |k| k == 2).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(2)));
        assert!(writes.is_empty());
    }

    #[test]
    fn test_stage_after_clear_ignores_committed() {
        let mut writes = WriteSet::new();
        writes.clear();
        writes.stage(&items(&[1, 2]), |_| true).unwrap();
        assert_eq!(writes.insert_count(), 2);
        assert_eq!(writes.visible_count(100), 2);
    }

    #[test]
    fn test_stage_rejects_repeat_in_batch_and_across_batches() {
        let mut writes = WriteSet::new();
        assert!(matches!(
            writes.stage(&items(&[3, 3]), |_| false),
            Err(StoreError::DuplicateKey(3))
        ));
        writes.stage(&items(&[3]), |_| false).unwrap();
        assert!(matches!(
            writes.stage(&items(&[4, 3]), |_| false),
            Err(StoreError::DuplicateKey(3))
        ));
        assert_eq!(writes.insert_count(), 1);
    }

    #[test]
    fn test_visible_count() {
        let mut writes = WriteSet::new();
        writes.stage(&items(&[10, 11]), |_| false).unwrap();
        assert_eq!(writes.visible_count(30), 32);
    }
}
