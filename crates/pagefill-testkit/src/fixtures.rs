//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;
use std::time::Duration;

use pagefill::{LoadDirection, LoadOutcome, Pager, PagingConfig, Result};
use pagefill_remote::{Fault, SimulatedFiller, SimulatedRemoteConfig};
use pagefill_store::MemoryStore;

/// Pager over the in-memory store and simulated remote.
pub type TestPager = Pager<MemoryStore, SimulatedFiller<MemoryStore>>;

/// Default remote latency for fixtures. Short enough for fast tests, long
/// enough that concurrent requests overlap.
pub const FIXTURE_LATENCY: Duration = Duration::from_millis(5);

/// A store, a remote filling it, and a pager over both.
pub struct TestFixture {
    pub store: Arc<MemoryStore>,
    pub filler: Arc<SimulatedFiller<MemoryStore>>,
    pub pager: TestPager,
}

impl TestFixture {
    /// Page size 30, short latency, unbounded remote.
    pub fn new() -> Self {
        Self::with_config(PagingConfig::with_page_size(30))
    }

    pub fn with_config(config: PagingConfig) -> Self {
        Self::with_remote(config, SimulatedRemoteConfig::with_latency(FIXTURE_LATENCY))
    }

    pub fn with_remote(config: PagingConfig, remote: SimulatedRemoteConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let filler = Arc::new(SimulatedFiller::new(Arc::clone(&store), remote));
        let pager = Pager::new(Arc::clone(&store), Arc::clone(&filler), config)
            .expect("fixture config must be valid");
        Self {
            store,
            filler,
            pager,
        }
    }

    pub fn inject_fault(&self, fault: Fault) {
        self.filler.inject_fault(fault);
    }

    pub async fn refresh(&self) -> Result<LoadOutcome> {
        self.pager.request(LoadDirection::Refresh, None).await
    }

    /// Prepend anchored at the first loaded key (0 when nothing is loaded).
    pub async fn prepend(&self) -> Result<LoadOutcome> {
        let anchor = self.pager.snapshot().first_key().unwrap_or(0);
        self.pager.request(LoadDirection::Prepend, Some(anchor)).await
    }

    /// Append anchored at the last loaded key (-1 when nothing is loaded).
    pub async fn append(&self) -> Result<LoadOutcome> {
        let anchor = self.pager.snapshot().last_key().unwrap_or(-1);
        self.pager.request(LoadDirection::Append, Some(anchor)).await
    }

    /// Keys visible in the latest snapshot.
    pub fn keys(&self) -> Vec<i64> {
        self.pager.snapshot().keys()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagefill_store::Store;

    #[tokio::test]
    async fn test_fixture_refresh_then_append() {
        let fixture = TestFixture::new();
        fixture.refresh().await.unwrap();
        fixture.append().await.unwrap();

        assert_eq!(fixture.keys(), (0..60).collect::<Vec<_>>());
        assert_eq!(fixture.store.count().await.unwrap(), 60);
        assert_eq!(fixture.filler.fill_count(), 2);
    }

    #[tokio::test]
    async fn test_fixture_append_on_empty_store_loads_first_block() {
        let fixture = TestFixture::with_config(PagingConfig::with_page_size(5));
        fixture.append().await.unwrap();
        assert_eq!(fixture.store.count().await.unwrap(), 5);
    }
}
