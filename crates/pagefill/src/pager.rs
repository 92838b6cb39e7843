//! The Pager: paged cache-fill coordinator.
//!
//! The Pager brings together the store, the page source and the remote
//! filler. It decides when remote fetches happen, keeps one load state per
//! direction, and publishes a snapshot of the consumer's window after every
//! change.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use pagefill_core::{FillResult, KeyRange, LoadDirection, LoadState, PageRequest, PagingConfig};
use pagefill_remote::{FillRequest, RemoteFiller};
use pagefill_store::Store;

use crate::error::{PagerError, Result};
use crate::page_source::PageSource;
use crate::snapshot::{DirectionStatus, LoadFailure, LoadStates, PageSnapshot};

/// Result of a [`Pager::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A fill ran to completion.
    Loaded {
        store_changed: bool,
        end_of_pagination: bool,
    },
    /// The direction was already loading; this request was dropped.
    Coalesced,
    /// The direction has no more data. Nothing was fetched.
    Exhausted,
}

impl LoadOutcome {
    pub fn store_changed(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { store_changed: true, .. })
    }

    pub fn end_of_pagination(&self) -> bool {
        match self {
            LoadOutcome::Loaded {
                end_of_pagination, ..
            } => *end_of_pagination,
            LoadOutcome::Exhausted => true,
            LoadOutcome::Coalesced => false,
        }
    }

    pub fn is_coalesced(&self) -> bool {
        matches!(self, LoadOutcome::Coalesced)
    }
}

/// Loads triggered by [`Pager::access`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessOutcome {
    pub prepend: Option<LoadOutcome>,
    pub append: Option<LoadOutcome>,
}

impl AccessOutcome {
    pub fn triggered(&self) -> bool {
        self.prepend.is_some() || self.append.is_some()
    }
}

/// The paged cache-fill coordinator.
///
/// Cheap to clone; clones share state. Fills run on spawned tasks so that a
/// started transaction finishes (commit or rollback) even if the caller stops
/// waiting or every handle to the Pager is dropped.
pub struct Pager<S: Store + 'static, F: RemoteFiller + 'static> {
    inner: Arc<PagerInner<S, F>>,
}

impl<S: Store + 'static, F: RemoteFiller + 'static> Clone for Pager<S, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct PagerInner<S: Store, F: RemoteFiller> {
    store: Arc<S>,
    filler: Arc<F>,
    source: PageSource<S>,
    config: PagingConfig,

    /// One critical section per direction.
    refresh: Mutex<DirectionCell>,
    prepend: Mutex<DirectionCell>,
    append: Mutex<DirectionCell>,

    /// Window the consumer currently sees.
    window: Mutex<PageRequest>,

    /// Serializes store reads for publication so snapshots go out in order.
    publish: tokio::sync::Mutex<()>,
    snapshots: watch::Sender<PageSnapshot>,
}

/// Load status of one direction plus the ticket of its current fill.
///
/// Each admitted fill takes the next ticket. A fill only writes its outcome
/// back while its ticket is still the current one.
#[derive(Debug, Default)]
struct DirectionCell {
    status: DirectionStatus,
    ticket: u64,
}

impl DirectionCell {
    fn settle(&mut self, ticket: u64, status: DirectionStatus) -> bool {
        if self.ticket != ticket || !self.status.state.is_loading() {
            return false;
        }
        self.status = status;
        true
    }
}

/// How a request entered its direction's critical section.
enum Admission {
    Started(u64),
    Coalesced,
    Exhausted,
}

impl<S: Store + 'static, F: RemoteFiller + 'static> Pager<S, F> {
    /// Create a pager over `store`, filled by `filler`.
    pub fn new(store: Arc<S>, filler: Arc<F>, config: PagingConfig) -> Result<Self> {
        config.validate()?;

        let window = PageRequest::from_start(config.initial_load_size);
        let (snapshots, _) = watch::channel(PageSnapshot::empty(
            window,
            config.placeholders_enabled,
        ));

        Ok(Self {
            inner: Arc::new(PagerInner {
                source: PageSource::new(Arc::clone(&store)),
                store,
                filler,
                config,
                refresh: Mutex::new(DirectionCell::default()),
                prepend: Mutex::new(DirectionCell::default()),
                append: Mutex::new(DirectionCell::default()),
                window: Mutex::new(window),
                publish: tokio::sync::Mutex::new(()),
                snapshots,
            }),
        })
    }

    pub fn config(&self) -> &PagingConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.inner.store
    }

    pub fn page_source(&self) -> &PageSource<S> {
        &self.inner.source
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────────────────────

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<PageSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> PageSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    pub fn load_states(&self) -> LoadStates {
        self.inner.load_states()
    }

    pub fn load_state(&self, direction: LoadDirection) -> LoadState {
        self.inner.lock(direction).status.state
    }

    /// Re-read the window from the store and publish it.
    ///
    /// Useful after opening a persistent store that already holds items.
    pub async fn reload(&self) -> Result<()> {
        self.inner.publish().await.map_err(|source| {
            PagerError::TransactionFailure {
                direction: LoadDirection::Refresh,
                source,
            }
        })
    }

    /// Show `window` to subscribers instead of the pager-managed window.
    ///
    /// The window still grows by each appended block afterwards.
    pub async fn set_window(&self, window: PageRequest) -> Result<()> {
        *self.inner.window() = window;
        self.reload().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────────

    /// Ask for more data in `direction`.
    ///
    /// `anchor` is the boundary key of the loaded data and is required for
    /// Prepend and Append; Refresh takes none. A request for a direction that
    /// is already loading returns [`LoadOutcome::Coalesced`] without fetching.
    pub async fn request(
        &self,
        direction: LoadDirection,
        anchor: Option<i64>,
    ) -> Result<LoadOutcome> {
        direction
            .check_anchor(anchor)
            .map_err(PagerError::InvalidRequest)?;

        if direction == LoadDirection::Prepend {
            return Ok(self.inner.close_prepend());
        }

        let ticket = match self.inner.admit(direction) {
            Admission::Coalesced => {
                tracing::debug!(%direction, "load already in flight, request coalesced");
                return Ok(LoadOutcome::Coalesced);
            }
            Admission::Exhausted => return Ok(LoadOutcome::Exhausted),
            Admission::Started(ticket) => ticket,
        };
        self.inner.publish_states();

        let mut guard = LoadingGuard {
            inner: Arc::clone(&self.inner),
            direction,
            ticket,
            armed: true,
        };
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let result = inner.run_fill(direction, ticket).await;
            guard.armed = false;
            result
        });

        match task.await {
            Ok(result) => result,
            Err(join) => Err(PagerError::TaskFailed {
                direction,
                message: join.to_string(),
            }),
        }
    }

    /// Consumer hint: the item at `position` of the current snapshot was shown.
    ///
    /// Triggers Append when `position` is within `prefetch_distance` items of
    /// the loaded end, and Prepend when within `prefetch_distance` of the start.
    pub async fn access(&self, position: usize) -> Result<AccessOutcome> {
        let snapshot = self.snapshot();
        let (Some(first), Some(last)) = (snapshot.first_key(), snapshot.last_key()) else {
            return Ok(AccessOutcome::default());
        };

        let distance = self.inner.config.prefetch_distance;
        let position = position.min(snapshot.len() - 1);
        let items_after = snapshot.len() - 1 - position;

        let mut outcome = AccessOutcome::default();
        if position <= distance {
            outcome.prepend = Some(self.request(LoadDirection::Prepend, Some(first)).await?);
        }
        if items_after <= distance {
            outcome.append = Some(self.request(LoadDirection::Append, Some(last)).await?);
        }
        Ok(outcome)
    }

    /// Re-request every direction whose last load failed.
    pub async fn retry(&self) -> Vec<(LoadDirection, Result<LoadOutcome>)> {
        let states = self.load_states();
        let mut results = Vec::new();

        if states.refresh.error.is_some() {
            results.push((
                LoadDirection::Refresh,
                self.request(LoadDirection::Refresh, None).await,
            ));
        }

        if states.append.error.is_some() {
            let anchor = match self.inner.store.last_key().await {
                Ok(anchor) => anchor,
                Err(source) => {
                    results.push((
                        LoadDirection::Append,
                        Err(PagerError::TransactionFailure {
                            direction: LoadDirection::Append,
                            source,
                        }),
                    ));
                    return results;
                }
            };
            // Nothing stored yet: anchor just before the first key.
            let anchor = anchor.unwrap_or(-1);
            results.push((
                LoadDirection::Append,
                self.request(LoadDirection::Append, Some(anchor)).await,
            ));
        }

        results
    }
}

impl<S: Store + 'static, F: RemoteFiller + 'static> PagerInner<S, F> {
    fn lock(&self, direction: LoadDirection) -> MutexGuard<'_, DirectionCell> {
        let cell = match direction {
            LoadDirection::Refresh => &self.refresh,
            LoadDirection::Prepend => &self.prepend,
            LoadDirection::Append => &self.append,
        };
        cell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn window(&self) -> MutexGuard<'_, PageRequest> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_states(&self) -> LoadStates {
        LoadStates {
            refresh: self.lock(LoadDirection::Refresh).status.clone(),
            prepend: self.lock(LoadDirection::Prepend).status.clone(),
            append: self.lock(LoadDirection::Append).status.clone(),
        }
    }

    /// Enter the direction's critical section: NotLoading becomes Loading.
    fn admit(&self, direction: LoadDirection) -> Admission {
        let mut cell = self.lock(direction);
        match cell.status.state {
            LoadState::Loading => Admission::Coalesced,
            LoadState::Done => Admission::Exhausted,
            LoadState::NotLoading => {
                cell.ticket += 1;
                cell.status = DirectionStatus {
                    state: LoadState::Loading,
                    error: None,
                };
                Admission::Started(cell.ticket)
            }
        }
    }

    /// Prepend is closed at the start of the dataset.
    fn close_prepend(&self) -> LoadOutcome {
        let changed = {
            let mut cell = self.lock(LoadDirection::Prepend);
            let changed = !cell.status.state.is_done() || cell.status.error.is_some();
            cell.status = DirectionStatus {
                state: LoadState::Done,
                error: None,
            };
            changed
        };
        if changed {
            tracing::debug!("prepend reached the start of the dataset");
            self.publish_states();
        }
        LoadOutcome::Exhausted
    }

    async fn run_fill(
        self: Arc<Self>,
        direction: LoadDirection,
        ticket: u64,
    ) -> Result<LoadOutcome> {
        let fill = async {
            let request = self.plan(direction).await?;
            self.filler
                .fill(request)
                .await
                .map_err(|e| PagerError::from_fill(direction, e))
        }
        .await;

        match fill {
            Ok(fill) => Ok(self.complete(direction, ticket, fill).await),
            Err(err) => {
                tracing::warn!(%direction, error = %err, "load failed");
                self.fail(direction, ticket, &err);
                Err(err)
            }
        }
    }

    /// Build the filler request for a direction.
    async fn plan(&self, direction: LoadDirection) -> Result<FillRequest> {
        match direction {
            LoadDirection::Refresh => Ok(FillRequest::Refresh {
                load_size: self.config.initial_load_size,
            }),
            LoadDirection::Append => {
                let count = self
                    .store
                    .count()
                    .await
                    .map_err(|source| PagerError::TransactionFailure { direction, source })?;
                let range = KeyRange::following(count, self.config.page_size)
                    .map_err(PagerError::InvalidRequest)?;
                Ok(FillRequest::Append { range })
            }
            // Closed in `request` before a task is spawned.
            LoadDirection::Prepend => Err(PagerError::TaskFailed {
                direction,
                message: "prepend never reaches the remote".into(),
            }),
        }
    }

    async fn complete(
        &self,
        direction: LoadDirection,
        ticket: u64,
        fill: FillResult,
    ) -> LoadOutcome {
        tracing::info!(
            %direction,
            written = fill.written,
            more = fill.more_data_available,
            "load completed"
        );

        let settled = DirectionStatus {
            state: if fill.more_data_available {
                LoadState::NotLoading
            } else {
                LoadState::Done
            },
            error: None,
        };

        let store_changed = match direction {
            LoadDirection::Refresh => {
                self.lock(LoadDirection::Refresh)
                    .settle(ticket, DirectionStatus::default());
                // A refresh invalidates what we knew about both ends. A fill
                // still in flight keeps its cell and settles it itself.
                for (other, status) in [
                    (LoadDirection::Prepend, DirectionStatus::default()),
                    (LoadDirection::Append, settled),
                ] {
                    let mut cell = self.lock(other);
                    if !cell.status.state.is_loading() {
                        cell.status = status;
                    }
                }
                *self.window() = PageRequest::from_start(self.config.initial_load_size);
                true
            }
            _ => {
                self.lock(direction).settle(ticket, settled);
                if fill.written > 0 {
                    let mut window = self.window();
                    window.page_size = window.page_size.saturating_add(fill.written);
                }
                fill.written > 0
            }
        };

        if let Err(e) = self.publish().await {
            tracing::warn!(%direction, error = %e, "could not read store after load");
            self.publish_states();
        }

        LoadOutcome::Loaded {
            store_changed,
            end_of_pagination: !fill.more_data_available,
        }
    }

    fn fail(&self, direction: LoadDirection, ticket: u64, err: &PagerError) {
        let settled = self.lock(direction).settle(
            ticket,
            DirectionStatus {
                state: LoadState::NotLoading,
                error: Some(LoadFailure::from(err)),
            },
        );
        if settled {
            self.publish_states();
        }
    }

    /// Publish a snapshot with only the load states changed.
    fn publish_states(&self) {
        let states = self.load_states();
        self.snapshots.send_modify(|snapshot| {
            snapshot.load_states = states;
            snapshot.generation += 1;
        });
    }

    /// Re-read the window through the page source and publish it.
    async fn publish(&self) -> pagefill_store::Result<()> {
        let _order = self.publish.lock().await;
        let window = *self.window();
        let items = self.source.read_request(&window).await?;
        let states = self.load_states();
        self.snapshots.send_modify(|snapshot| {
            snapshot.items = items;
            snapshot.window = window;
            snapshot.load_states = states;
            snapshot.generation += 1;
        });
        Ok(())
    }
}

/// Returns a direction to NotLoading if its fill task never finished.
struct LoadingGuard<S: Store + 'static, F: RemoteFiller + 'static> {
    inner: Arc<PagerInner<S, F>>,
    direction: LoadDirection,
    ticket: u64,
    armed: bool,
}

impl<S: Store + 'static, F: RemoteFiller + 'static> Drop for LoadingGuard<S, F> {
    fn drop(&mut self) {
        if self.armed {
            let err = PagerError::TaskFailed {
                direction: self.direction,
                message: "fill task did not finish".into(),
            };
            tracing::warn!(direction = %self.direction, "fill task aborted");
            self.inner.fail(self.direction, self.ticket, &err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagefill_remote::{Fault, SimulatedFiller, SimulatedRemoteConfig};
    use pagefill_store::MemoryStore;
    use std::time::Duration;

    type TestPager = Pager<MemoryStore, SimulatedFiller<MemoryStore>>;

    fn pager_with(latency: Duration, config: PagingConfig) -> TestPager {
        let store = Arc::new(MemoryStore::new());
        let filler = Arc::new(SimulatedFiller::new(
            Arc::clone(&store),
            SimulatedRemoteConfig::with_latency(latency),
        ));
        Pager::new(store, filler, config).unwrap()
    }

    fn pager() -> TestPager {
        pager_with(Duration::from_millis(5), PagingConfig::with_page_size(30))
    }

    #[tokio::test]
    async fn test_refresh_loads_first_page() {
        let pager = pager();
        let outcome = pager.request(LoadDirection::Refresh, None).await.unwrap();

        assert_eq!(
            outcome,
            LoadOutcome::Loaded {
                store_changed: true,
                end_of_pagination: false
            }
        );
        assert_eq!(pager.snapshot().keys(), (0..30).collect::<Vec<_>>());
        assert_eq!(pager.load_state(LoadDirection::Refresh), LoadState::NotLoading);
    }

    #[tokio::test]
    async fn test_missing_anchor_rejected_before_io() {
        let pager = pager();
        let err = pager.request(LoadDirection::Append, None).await.unwrap_err();
        assert!(matches!(err, PagerError::InvalidRequest(_)));

        let err = pager
            .request(LoadDirection::Refresh, Some(4))
            .await
            .unwrap_err();
        assert!(matches!(err, PagerError::InvalidRequest(_)));

        assert_eq!(pager.load_states(), LoadStates::default());
        assert_eq!(pager.store().commit_count(), 0);
    }

    #[tokio::test]
    async fn test_prepend_is_exhausted_and_never_fetches() {
        let pager = pager();
        pager.request(LoadDirection::Refresh, None).await.unwrap();
        let commits = pager.store().commit_count();

        let outcome = pager.request(LoadDirection::Prepend, Some(0)).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Exhausted);
        assert!(outcome.end_of_pagination());
        assert!(!outcome.store_changed());
        assert_eq!(pager.load_state(LoadDirection::Prepend), LoadState::Done);
        assert_eq!(pager.store().commit_count(), commits);
    }

    #[tokio::test]
    async fn test_append_after_refresh_extends_window() {
        let pager = pager();
        pager.request(LoadDirection::Refresh, None).await.unwrap();

        let outcome = pager
            .request(LoadDirection::Append, Some(29))
            .await
            .unwrap();
        assert!(outcome.store_changed());
        assert!(!outcome.end_of_pagination());

        let snapshot = pager.snapshot();
        assert_eq!(snapshot.keys(), (0..60).collect::<Vec<_>>());
        assert_eq!(snapshot.window.page_size, 60);
    }

    #[tokio::test]
    async fn test_failure_reported_and_state_reset() {
        let pager = pager();
        pager.request(LoadDirection::Refresh, None).await.unwrap();

        pager.inner.filler.inject_fault(Fault::Remote);
        let err = pager
            .request(LoadDirection::Append, Some(29))
            .await
            .unwrap_err();
        assert!(matches!(err, PagerError::RemoteFailure { .. }));

        let snapshot = pager.snapshot();
        assert_eq!(snapshot.len(), 30);
        assert_eq!(
            snapshot.load_states.state(LoadDirection::Append),
            LoadState::NotLoading
        );
        let failure = snapshot.load_states.error(LoadDirection::Append).unwrap();
        assert!(failure.retryable);

        let retried = pager.retry().await;
        assert_eq!(retried.len(), 1);
        assert!(retried[0].1.as_ref().unwrap().store_changed());
        assert!(pager.snapshot().load_states.error(LoadDirection::Append).is_none());
        assert_eq!(pager.snapshot().len(), 60);
    }

    #[tokio::test]
    async fn test_retry_failed_append_on_empty_store() {
        let pager = pager();
        pager.inner.filler.inject_fault(Fault::Remote);
        pager
            .request(LoadDirection::Append, Some(-1))
            .await
            .unwrap_err();
        assert!(pager.load_states().error(LoadDirection::Append).is_some());

        let retried = pager.retry().await;
        assert_eq!(retried.len(), 1);
        assert_eq!(retried[0].0, LoadDirection::Append);
        assert!(retried[0].1.as_ref().unwrap().store_changed());
        assert_eq!(pager.snapshot().keys(), (0..30).collect::<Vec<_>>());
        assert!(pager.load_states().error(LoadDirection::Append).is_none());
    }

    #[test]
    fn test_stale_ticket_cannot_settle() {
        let mut cell = DirectionCell::default();
        cell.ticket = 2;
        cell.status.state = LoadState::Loading;

        assert!(!cell.settle(1, DirectionStatus::default()));
        assert_eq!(cell.status.state, LoadState::Loading);

        assert!(cell.settle(2, DirectionStatus::default()));
        assert_eq!(cell.status.state, LoadState::NotLoading);

        // Already settled.
        assert!(!cell.settle(2, DirectionStatus::default()));
    }

    #[tokio::test]
    async fn test_second_refresh_coalesced_while_loading() {
        let pager = pager_with(Duration::from_millis(100), PagingConfig::with_page_size(30));

        let first = {
            let pager = pager.clone();
            tokio::spawn(async move { pager.request(LoadDirection::Refresh, None).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(pager.load_state(LoadDirection::Refresh), LoadState::Loading);

        let second = pager.request(LoadDirection::Refresh, None).await.unwrap();
        assert_eq!(second, LoadOutcome::Coalesced);

        first.await.unwrap().unwrap();
        assert_eq!(pager.inner.filler.fill_count(), 1);
        assert_eq!(pager.store().commit_count(), 1);
    }

    #[tokio::test]
    async fn test_access_near_end_triggers_append() {
        let pager = pager_with(
            Duration::from_millis(1),
            PagingConfig::with_page_size(10).prefetch_distance(2),
        );
        pager.request(LoadDirection::Refresh, None).await.unwrap();

        let idle = pager.access(5).await.unwrap();
        assert!(!idle.triggered());

        let near_end = pager.access(7).await.unwrap();
        assert!(near_end.append.unwrap().store_changed());
        assert!(near_end.prepend.is_none());
        assert_eq!(pager.snapshot().len(), 20);

        let near_start = pager.access(1).await.unwrap();
        assert_eq!(near_start.prepend, Some(LoadOutcome::Exhausted));
    }

    #[tokio::test]
    async fn test_access_on_empty_snapshot_does_nothing() {
        let pager = pager();
        assert_eq!(pager.access(0).await.unwrap(), AccessOutcome::default());
    }

    #[tokio::test]
    async fn test_refresh_resets_exhaustion() {
        let pager = pager();
        pager.request(LoadDirection::Prepend, Some(0)).await.unwrap();
        assert_eq!(pager.load_state(LoadDirection::Prepend), LoadState::Done);

        pager.request(LoadDirection::Refresh, None).await.unwrap();
        assert_eq!(pager.load_state(LoadDirection::Prepend), LoadState::NotLoading);

        // Still closed at the start.
        let outcome = pager.request(LoadDirection::Prepend, Some(0)).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Exhausted);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let store = Arc::new(MemoryStore::new());
        let filler = Arc::new(SimulatedFiller::new(
            Arc::clone(&store),
            SimulatedRemoteConfig::default(),
        ));
        let result = Pager::new(store, filler, PagingConfig::with_page_size(0));
        assert!(matches!(result, Err(PagerError::Config(_))));
    }
}
