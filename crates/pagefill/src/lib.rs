//! # Pagefill
//!
//! Incremental page loading backed by a local cache that is refilled from a
//! remote source.
//!
//! ## Overview
//!
//! The [`Pager`] is the single authority deciding when remote fetches
//! happen. Consumers ask for more data in a direction:
//!
//! - **Refresh** replaces the whole dataset with a fresh first block
//! - **Prepend** is closed at the start and always reports exhaustion
//! - **Append** fetches the next block after the items already stored
//!
//! Each direction is its own critical section. A request for a direction
//! that is already loading is coalesced, never queued. Fetched data is
//! merged into the durable [`Store`](store::Store) in one transaction, and
//! every change is published as a [`PageSnapshot`] to subscribers.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pagefill::{LoadDirection, Pager, PagingConfig};
//! use pagefill::remote::{SimulatedFiller, SimulatedRemoteConfig};
//! use pagefill::store::MemoryStore;
//!
//! async fn example() {
//!     let store = Arc::new(MemoryStore::new());
//!     let filler = Arc::new(SimulatedFiller::new(
//!         Arc::clone(&store),
//!         SimulatedRemoteConfig::default(),
//!     ));
//!     let pager = Pager::new(store, filler, PagingConfig::default()).unwrap();
//!
//!     let mut snapshots = pager.subscribe();
//!
//!     pager.request(LoadDirection::Refresh, None).await.unwrap();
//!     let last = pager.snapshot().keys().last().copied();
//!     pager.request(LoadDirection::Append, last).await.unwrap();
//!
//!     snapshots.changed().await.unwrap();
//!     assert_eq!(snapshots.borrow().items.len(), 60);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `pagefill::core` - Data model (Item, KeyRange, PagingConfig, ...)
//! - `pagefill::store` - Durable store abstraction, memory and SQLite backends
//! - `pagefill::remote` - Remote filler abstraction and simulated source

pub mod error;
pub mod page_source;
pub mod pager;
pub mod snapshot;

// Re-export component crates
pub use pagefill_core as core;
pub use pagefill_remote as remote;
pub use pagefill_store as store;

// Re-export main types for convenience
pub use error::{PagerError, Result};
pub use page_source::PageSource;
pub use pager::{AccessOutcome, LoadOutcome, Pager};
pub use snapshot::{DirectionStatus, LoadFailure, LoadStates, PageSnapshot, Row};

// Re-export commonly used core types
pub use pagefill_core::{
    FillResult, Item, KeyRange, LoadDirection, LoadState, PageRequest, PagingConfig,
};
