//! # Pagefill Core
//!
//! Pure data model for the pagefill engine: items, key ranges, load
//! directions, per-direction load state, and paging configuration.
//!
//! This crate contains no I/O, no storage, no async runtime. Everything here
//! is plain data shared by the store, the remote filler and the pager.
//!
//! ## Key Types
//!
//! - [`Item`] - A row of the durable table, unique by key
//! - [`KeyRange`] - Half-open range of keys, used to describe appended blocks
//! - [`LoadDirection`] - Which end of the dataset a load extends
//! - [`LoadState`] - Per-direction progress owned by the pager
//! - [`PagingConfig`] - Page size, prefetch distance, initial load size, placeholders

pub mod config;
pub mod error;
pub mod load;
pub mod types;

pub use config::PagingConfig;
pub use error::{ConfigError, CoreError};
pub use load::{FillResult, LoadDirection, LoadState, PageRequest};
pub use types::{Item, KeyRange};
