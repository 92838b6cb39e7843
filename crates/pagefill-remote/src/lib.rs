//! # Pagefill Remote
//!
//! The remote side of the cache: fetch data for a load direction and write
//! it into the durable store inside one transaction.
//!
//! ## Overview
//!
//! A [`RemoteFiller`] receives a [`FillRequest`] describing what the pager
//! needs (a full reload for Refresh, an exact key range for Append) and
//! reports whether more data exists. The store mutation must be atomic: a
//! failing fill leaves the store exactly as it was.
//!
//! [`SimulatedFiller`] stands in for a real network source. It waits a fixed
//! latency, synthesizes items by key, and can be scripted to fail.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pagefill_remote::{FillRequest, RemoteFiller, SimulatedFiller, SimulatedRemoteConfig};
//! use pagefill_store::MemoryStore;
//!
//! async fn example() {
//!     let store = Arc::new(MemoryStore::new());
//!     let filler = SimulatedFiller::new(Arc::clone(&store), SimulatedRemoteConfig::default());
//!
//!     let result = filler.fill(FillRequest::Refresh { load_size: 30 }).await.unwrap();
//!     assert!(result.more_data_available);
//! }
//! ```

pub mod error;
pub mod filler;

pub use error::{FillError, Result};
pub use filler::{
    simulated::{Fault, SimulatedFiller, SimulatedRemoteConfig},
    FillRequest, RemoteFiller,
};
