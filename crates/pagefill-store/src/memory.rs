//! In-memory implementation of the Store trait.
//!
//! Same semantics as SQLite but keeps everything in memory with no
//! persistence. Used by tests and the demo.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};

use pagefill_core::Item;

use crate::error::{Result, StoreError};
use crate::traits::{Store, Transaction, WriteSet};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Reads go through an RwLock;
/// transactions additionally hold the writer mutex until they finish.
pub struct MemoryStore {
    /// Committed items, keyed by item key.
    items: RwLock<BTreeMap<i64, Item>>,

    /// Writer slot. Held by the open transaction, if any.
    writer: Mutex<()>,

    /// Number of committed transactions.
    commits: AtomicU64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            writer: Mutex::new(()),
            commits: AtomicU64::new(0),
        }
    }

    /// Create a store already holding `items`.
    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().map(|item| (item.key, item)).collect()),
            ..Self::new()
        }
    }

    /// Number of transactions committed so far.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<i64, Item>>> {
        self.items
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<i64, Item>>> {
        self.items
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin_transaction<'a>(&'a self) -> Result<Box<dyn Transaction + 'a>> {
        let writer = self.writer.lock().await;
        Ok(Box::new(MemoryTransaction {
            store: self,
            _writer: writer,
            writes: WriteSet::new(),
            finished: false,
        }))
    }

    async fn query_range(&self, start_key: i64, limit: usize) -> Result<Vec<Item>> {
        let items = self.read()?;
        Ok(items.range(start_key..).take(limit).map(|(_, item)| *item).collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.read()?.len() as u64)
    }

    async fn last_key(&self) -> Result<Option<i64>> {
        Ok(self.read()?.keys().next_back().copied())
    }
}

/// Transaction over a [`MemoryStore`].
struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    _writer: MutexGuard<'a, ()>,
    writes: WriteSet,
    finished: bool,
}

impl MemoryTransaction<'_> {
    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            return Err(StoreError::TransactionClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl Transaction for MemoryTransaction<'_> {
    async fn delete_all(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.writes.clear();
        Ok(())
    }

    async fn insert_many(&mut self, items: &[Item]) -> Result<()> {
        self.ensure_open()?;
        let committed = self.store.read()?;
        self.writes.stage(items, |key| committed.contains_key(&key))
    }

    async fn count(&self) -> Result<u64> {
        self.ensure_open()?;
        let committed = self.store.read()?.len() as u64;
        Ok(self.writes.visible_count(committed))
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.finished = true;

        let writes = std::mem::take(&mut self.writes);
        let mut items = self.store.write()?;
        if writes.is_cleared() {
            items.clear();
        }
        items.extend(writes.inserts().map(|item| (item.key, *item)));
        drop(items);

        self.store.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.finished = true;
        self.writes = WriteSet::new();
        Ok(())
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.writes.is_empty() {
            tracing::debug!(
                staged = self.writes.insert_count(),
                "memory transaction dropped without commit, rolled back"
            );
        }
    }
}
