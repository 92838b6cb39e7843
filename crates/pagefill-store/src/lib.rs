//! # Pagefill Store
//!
//! The durable, key-ordered item table behind the pager. Provides a
//! trait-based interface with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The [`Store`] trait exposes committed reads (`query_range`, `count`) and
//! hands out a [`Transaction`] for writes. A transaction stages
//! `delete_all` / `insert_many` and applies them as one unit on commit, so
//! readers only ever observe the state before or after it.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for reads and transaction creation
//! - [`Transaction`] - Staged writes with commit/rollback
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests and the demo
//! - [`StoreExt`] - `replace_all` / `append` as single transactions
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pagefill_core::Item;
//! use pagefill_store::{MemoryStore, Store, StoreExt};
//!
//! async fn example() {
//!     let store = MemoryStore::new();
//!
//!     store.replace_all(&[Item::new(0), Item::new(1)]).await.unwrap();
//!     store.append(&[Item::new(2)]).await.unwrap();
//!
//!     let page = store.query_range(1, 10).await.unwrap();
//!     assert_eq!(page.len(), 2);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **One writer**: `begin_transaction` waits for the previous transaction to finish
//! - **Unique keys**: inserting a key that is already visible fails with `DuplicateKey`
//! - **Rollback on drop**: an uncommitted transaction leaves no trace

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Store, StoreExt, Transaction, WriteSet};
