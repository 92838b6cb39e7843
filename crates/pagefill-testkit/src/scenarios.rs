//! Canned request sequences with known outcomes.
//!
//! Each scenario drives a fresh [`TestFixture`] and names the keys the
//! store must hold afterwards. Scenarios serialize to JSON so they can be
//! shared with other pager implementations.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use pagefill::{LoadDirection, PagerError, PagingConfig, Result};
use pagefill_remote::{Fault, SimulatedRemoteConfig};
use pagefill_store::Store;

use crate::fixtures::{TestFixture, FIXTURE_LATENCY};

/// One action against a fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Refresh,
    Prepend,
    Append,
    /// Fail the next remote fetch before it reaches the store.
    FailRemote,
    /// Fail the next fill after it staged writes.
    FailMidTransaction,
}

impl Step {
    pub async fn apply(self, fixture: &TestFixture) -> Result<()> {
        match self {
            Step::Refresh => fixture.refresh().await.map(drop),
            Step::Prepend => fixture.prepend().await.map(drop),
            Step::Append => fixture.append().await.map(drop),
            Step::FailRemote => {
                fixture.inject_fault(Fault::Remote);
                Ok(())
            }
            Step::FailMidTransaction => {
                fixture.inject_fault(Fault::MidTransaction);
                Ok(())
            }
        }
    }
}

/// A named request sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub page_size: usize,
    /// Remote dataset size; `None` is unbounded.
    pub max_items: Option<u64>,
    pub steps: Vec<Step>,
    /// The store holds exactly `expected_start..expected_end` afterwards.
    pub expected_start: i64,
    pub expected_end: i64,
}

impl Scenario {
    pub fn expected_keys(&self) -> Vec<i64> {
        self.expected_range().collect()
    }

    pub fn expected_range(&self) -> Range<i64> {
        self.expected_start..self.expected_end
    }

    pub fn fixture(&self) -> TestFixture {
        let mut remote = SimulatedRemoteConfig::with_latency(FIXTURE_LATENCY);
        if let Some(max) = self.max_items {
            remote = remote.max_items(max);
        }
        TestFixture::with_remote(PagingConfig::with_page_size(self.page_size), remote)
    }
}

/// Run `scenario` on a fresh fixture and return every key in the store.
///
/// Retryable load failures are part of some scenarios and do not stop the run.
pub async fn run_scenario(scenario: &Scenario) -> Result<Vec<i64>> {
    let fixture = scenario.fixture();
    for step in &scenario.steps {
        match step.apply(&fixture).await {
            Err(e) if !e.is_retryable() => return Err(e),
            _ => {}
        }
    }

    let items = fixture
        .store
        .query_range(i64::MIN, usize::MAX)
        .await
        .map_err(|source| PagerError::TransactionFailure {
            direction: LoadDirection::Refresh,
            source,
        })?;
    Ok(items.into_iter().map(|item| item.key).collect())
}

fn scenario(
    name: &str,
    page_size: usize,
    max_items: Option<u64>,
    steps: &[Step],
    expected: Range<i64>,
) -> Scenario {
    Scenario {
        name: name.to_string(),
        page_size,
        max_items,
        steps: steps.to_vec(),
        expected_start: expected.start,
        expected_end: expected.end,
    }
}

/// All canned scenarios.
pub fn all_scenarios() -> Vec<Scenario> {
    use Step::*;

    vec![
        scenario("first page", 30, None, &[Refresh], 0..30),
        scenario("refresh then append", 30, None, &[Refresh, Append], 0..60),
        scenario(
            "refresh, prepend, append, append",
            30,
            None,
            &[Refresh, Prepend, Append, Append],
            0..90,
        ),
        scenario("prepend fetches nothing", 10, None, &[Prepend, Prepend], 0..0),
        scenario("refresh is idempotent", 30, None, &[Refresh, Append, Refresh], 0..30),
        scenario(
            "failed refresh keeps old contents",
            20,
            None,
            &[Refresh, Append, FailMidTransaction, Refresh],
            0..40,
        ),
        scenario(
            "failed append is retried",
            10,
            None,
            &[Refresh, FailRemote, Append, Append],
            0..20,
        ),
        scenario(
            "append stops at end of remote data",
            30,
            Some(45),
            &[Refresh, Append, Append, Append],
            0..45,
        ),
        scenario("small remote", 30, Some(12), &[Refresh, Append], 0..12),
    ]
}

/// Serialize all scenarios as pretty JSON.
pub fn scenarios_json() -> String {
    serde_json::to_string_pretty(&all_scenarios()).unwrap_or_default()
}
