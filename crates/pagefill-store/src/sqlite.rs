//! SQLite implementation of the Store trait.
//!
//! The persistent backend. Uses rusqlite with bundled SQLite; blocking calls
//! run on `tokio::task::spawn_blocking`.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::sync::MutexGuard;

use pagefill_core::Item;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{Store, Transaction, WriteSet};

/// SQLite-based store implementation.
///
/// The connection sits behind a mutex and is only touched from the blocking
/// pool. Transactions stage their writes in memory and apply them inside a
/// single SQLite transaction on commit.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,

    /// Writer slot. Held by the open transaction, if any.
    writer: tokio::sync::Mutex<()>,

    /// Number of committed transactions since open.
    commits: AtomicU64,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            writer: tokio::sync::Mutex::new(()),
            commits: AtomicU64::new(0),
        }
    }

    /// Number of transactions committed since the store was opened.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Run `f` against the connection on the blocking pool.
    ///
    /// The closure runs to completion even if the returned future is dropped.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::LockPoisoned(format!("sqlite connection: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }

    /// Keys among `keys` that already exist in the committed table.
    async fn existing_keys(&self, keys: Vec<i64>) -> Result<BTreeSet<i64>> {
        self.blocking(move |conn| {
            let mut stmt = conn.prepare_cached("SELECT 1 FROM items WHERE key = ?1")?;
            let mut found = BTreeSet::new();
            for key in keys {
                if stmt.exists(params![key])? {
                    found.insert(key);
                }
            }
            Ok(found)
        })
        .await
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn begin_transaction<'a>(&'a self) -> Result<Box<dyn Transaction + 'a>> {
        let writer = self.writer.lock().await;
        Ok(Box::new(SqliteTransaction {
            store: self,
            _writer: writer,
            writes: WriteSet::new(),
            finished: false,
        }))
    }

    async fn query_range(&self, start_key: i64, limit: usize) -> Result<Vec<Item>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.blocking(move |conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT key FROM items
                 WHERE key >= ?1
                 ORDER BY key
                 LIMIT ?2",
            )?;
            let items = stmt
                .query_map(params![start_key, limit], |row| row.get::<_, i64>(0))?
                .map(|key| key.map(Item::new))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(items)
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn last_key(&self) -> Result<Option<i64>> {
        self.blocking(|conn| {
            let key: Option<i64> =
                conn.query_row("SELECT MAX(key) FROM items", [], |row| row.get(0))?;
            Ok(key)
        })
        .await
    }
}

/// Transaction over a [`SqliteStore`].
struct SqliteTransaction<'a> {
    store: &'a SqliteStore,
    _writer: MutexGuard<'a, ()>,
    writes: WriteSet,
    finished: bool,
}

impl SqliteTransaction<'_> {
    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            return Err(StoreError::TransactionClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl Transaction for SqliteTransaction<'_> {
    async fn delete_all(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.writes.clear();
        Ok(())
    }

    async fn insert_many(&mut self, items: &[Item]) -> Result<()> {
        self.ensure_open()?;
        let existing = if self.writes.is_cleared() {
            BTreeSet::new()
        } else {
            self.store
                .existing_keys(items.iter().map(|item| item.key).collect())
                .await?
        };
        self.writes.stage(items, |key| existing.contains(&key))
    }

    async fn count(&self) -> Result<u64> {
        self.ensure_open()?;
        let committed = if self.writes.is_cleared() {
            0
        } else {
            self.store.count().await?
        };
        Ok(self.writes.visible_count(committed))
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.finished = true;

        let writes = std::mem::take(&mut self.writes);
        let inserted = writes.insert_count();
        self.store
            .blocking(move |conn| {
                let tx = conn.transaction()?;
                if writes.is_cleared() {
                    tx.execute("DELETE FROM items", [])?;
                }
                {
                    let mut stmt = tx.prepare_cached("INSERT INTO items (key) VALUES (?1)")?;
                    for item in writes.inserts() {
                        stmt.execute(params![item.key])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;

        self.store.commits.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(inserted, "sqlite transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.finished = true;
        self.writes = WriteSet::new();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StoreExt;
    use pagefill_core::KeyRange;

    fn range(start: i64, end: i64) -> Vec<Item> {
        KeyRange::new(start, end).unwrap().items()
    }

    fn keys(items: &[Item]) -> Vec<i64> {
        items.iter().map(|i| i.key).collect()
    }

    #[tokio::test]
    async fn test_replace_then_append() {
        let store = SqliteStore::open_memory().unwrap();

        store.replace_all(&range(0, 30)).await.unwrap();
        store.append(&range(30, 60)).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 60);
        assert_eq!(store.last_key().await.unwrap(), Some(59));
        let page = store.query_range(25, 10).await.unwrap();
        assert_eq!(keys(&page), (25..35).collect::<Vec<_>>());
        assert_eq!(store.commit_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let store = SqliteStore::open_memory().unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.last_key().await.unwrap(), None);
        assert!(store.query_range(0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_staged_delete_invisible_until_commit() {
        let store = SqliteStore::open_memory().unwrap();
        store.replace_all(&range(0, 5)).await.unwrap();

        let mut tx = store.begin_transaction().await.unwrap();
        tx.delete_all().await.unwrap();
        tx.insert_many(&range(10, 12)).await.unwrap();
        assert_eq!(tx.count().await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 5);

        tx.rollback().await.unwrap();
        drop(tx);
        assert_eq!(keys(&store.query_range(0, 10).await.unwrap()), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let store = SqliteStore::open_memory().unwrap();
        store.replace_all(&range(0, 3)).await.unwrap();

        let err = store.append(&range(2, 4)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(2)));
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.replace_all(&range(0, 30)).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count().await.unwrap(), 30);
        assert_eq!(store.commit_count(), 0);
    }
}
