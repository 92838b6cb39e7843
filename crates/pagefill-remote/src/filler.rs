//! Remote filler abstraction.
//!
//! The filler owns the "network" half of a load: fetch data for a direction
//! and merge it into the store in one transaction. Implementations may use
//! HTTP, gRPC, or anything else; [`simulated`] ships a latency-only stand-in.

use async_trait::async_trait;

use pagefill_core::{FillResult, KeyRange, LoadDirection};

use crate::error::Result;

/// What the pager asks the remote source for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRequest {
    /// Replace the whole store with a fresh first block of `load_size` items.
    Refresh { load_size: usize },
    /// Insert exactly the keys in `range` after the current data.
    Append { range: KeyRange },
}

impl FillRequest {
    pub fn direction(&self) -> LoadDirection {
        match self {
            FillRequest::Refresh { .. } => LoadDirection::Refresh,
            FillRequest::Append { .. } => LoadDirection::Append,
        }
    }
}

/// Fetches remote data and writes it into the store.
///
/// Implementations must be thread-safe (Send + Sync) and must perform their
/// store mutation as a single transaction: on error the store is unchanged.
#[async_trait]
pub trait RemoteFiller: Send + Sync {
    /// Fetch data for `request` and commit it to the store.
    async fn fill(&self, request: FillRequest) -> Result<FillResult>;
}

/// A simulated remote source for tests and the demo.
///
/// Items are synthesized by key after a fixed delay. Faults can be queued
/// to exercise the failure paths.
pub mod simulated {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use pagefill_store::{Store, StoreError};

    use crate::error::FillError;

    /// Configuration for [`SimulatedFiller`].
    #[derive(Debug, Clone)]
    pub struct SimulatedRemoteConfig {
        /// Delay before each fill touches the store.
        pub latency: Duration,
        /// Size of the remote dataset. `None` means unbounded.
        pub max_items: Option<u64>,
    }

    impl Default for SimulatedRemoteConfig {
        fn default() -> Self {
            Self {
                latency: Duration::from_secs(1),
                max_items: None,
            }
        }
    }

    impl SimulatedRemoteConfig {
        pub fn with_latency(latency: Duration) -> Self {
            Self {
                latency,
                ..Self::default()
            }
        }

        pub fn max_items(mut self, max: u64) -> Self {
            self.max_items = Some(max);
            self
        }
    }

    /// A scripted failure for the next fill.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Fault {
        /// Fail before touching the store.
        Remote,
        /// Fail inside the transaction, after the delete and before the insert.
        MidTransaction,
    }

    /// Simulated remote source.
    pub struct SimulatedFiller<S: Store> {
        store: Arc<S>,
        config: SimulatedRemoteConfig,
        faults: Mutex<VecDeque<Fault>>,
        fills: AtomicU64,
    }

    impl<S: Store> SimulatedFiller<S> {
        pub fn new(store: Arc<S>, config: SimulatedRemoteConfig) -> Self {
            Self {
                store,
                config,
                faults: Mutex::new(VecDeque::new()),
                fills: AtomicU64::new(0),
            }
        }

        /// Queue a fault. Each fill consumes at most one.
        pub fn inject_fault(&self, fault: Fault) {
            if let Ok(mut faults) = self.faults.lock() {
                faults.push_back(fault);
            }
        }

        /// Number of fills invoked so far, including failed ones.
        pub fn fill_count(&self) -> u64 {
            self.fills.load(Ordering::SeqCst)
        }

        pub fn store(&self) -> &Arc<S> {
            &self.store
        }

        fn next_fault(&self) -> Option<Fault> {
            self.faults.lock().ok().and_then(|mut faults| faults.pop_front())
        }

        /// Clamp `[start, end)` to the remote dataset size.
        fn clamp(&self, start: i64, end: i64) -> (i64, bool) {
            match self.config.max_items {
                Some(max) => {
                    let max = i64::try_from(max).unwrap_or(i64::MAX);
                    let end = end.min(max).max(start);
                    (end, end < max)
                }
                None => (end, true),
            }
        }

        async fn refresh(&self, load_size: usize, fault: Option<Fault>) -> Result<FillResult> {
            let block = KeyRange::following(0, load_size)?;
            let (end, more) = self.clamp(block.start, block.end);
            let items = KeyRange::new(block.start, end)?.items();

            let mut tx = self.store.begin_transaction().await?;
            tx.delete_all().await?;
            if fault == Some(Fault::MidTransaction) {
                tx.rollback().await?;
                return Err(StoreError::Aborted("simulated fault after delete".into()).into());
            }
            tx.insert_many(&items).await?;
            tx.commit().await?;

            Ok(FillResult {
                more_data_available: more,
                written: items.len(),
            })
        }

        async fn append(&self, range: KeyRange, fault: Option<Fault>) -> Result<FillResult> {
            let mut tx = self.store.begin_transaction().await?;

            // The range was computed from a count read before this transaction;
            // a refresh may have committed in between.
            let count = tx.count().await?;
            if i64::try_from(count).ok() != Some(range.start) {
                tx.rollback().await?;
                return Err(StoreError::Conflict(format!(
                    "append range {} does not follow {} stored items",
                    range, count
                ))
                .into());
            }

            if fault == Some(Fault::MidTransaction) {
                tx.rollback().await?;
                return Err(StoreError::Aborted("simulated fault before insert".into()).into());
            }

            let (end, more) = self.clamp(range.start, range.end);
            let items = KeyRange::new(range.start, end)?.items();
            if items.is_empty() {
                tx.rollback().await?;
                return Ok(FillResult::exhausted(0));
            }

            tx.insert_many(&items).await?;
            tx.commit().await?;

            Ok(FillResult {
                more_data_available: more,
                written: items.len(),
            })
        }
    }

    #[async_trait]
    impl<S: Store> RemoteFiller for SimulatedFiller<S> {
        async fn fill(&self, request: FillRequest) -> Result<FillResult> {
            let call = self.fills.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::debug!(call, direction = %request.direction(), ?request, "simulated remote fill");

            tokio::time::sleep(self.config.latency).await;

            let fault = self.next_fault();
            if fault == Some(Fault::Remote) {
                return Err(FillError::Remote("simulated remote failure".into()));
            }

            match request {
                FillRequest::Refresh { load_size } => self.refresh(load_size, fault).await,
                FillRequest::Append { range } => self.append(range, fault).await,
            }
        }
    }
}
