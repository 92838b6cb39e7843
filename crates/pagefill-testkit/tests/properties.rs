//! Property tests: random request sequences against the simulated remote.

use proptest::prelude::*;

use pagefill_remote::SimulatedRemoteConfig;
use pagefill_store::Store;
use pagefill_testkit::fixtures::{TestFixture, FIXTURE_LATENCY};
use pagefill_testkit::generators::{max_items, paging_config, steps};
use pagefill_testkit::Step;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn store_keys_stay_dense_and_unique(
        config in paging_config(),
        max in max_items(),
        steps in steps(12),
    ) {
        let rt = runtime();
        let (keys, snapshot_keys) = rt.block_on(async {
            let mut remote = SimulatedRemoteConfig::with_latency(FIXTURE_LATENCY);
            if let Some(max) = max {
                remote = remote.max_items(max);
            }
            let fixture = TestFixture::with_remote(config.clone(), remote);

            for step in &steps {
                let commits = fixture.store.commit_count();
                let result = step.apply(&fixture).await;
                if let Err(e) = &result {
                    assert!(e.is_retryable(), "unexpected error: {e}");
                }
                if *step == Step::Prepend {
                    assert_eq!(fixture.store.commit_count(), commits);
                }
            }

            let keys: Vec<i64> = fixture
                .store
                .query_range(i64::MIN, usize::MAX)
                .await
                .unwrap()
                .into_iter()
                .map(|item| item.key)
                .collect();
            (keys, fixture.keys())
        });

        let expected: Vec<i64> = (0..keys.len() as i64).collect();
        prop_assert_eq!(&keys, &expected);
        if let Some(max) = max {
            prop_assert!(keys.len() as u64 <= max);
        }
        // The snapshot is a prefix of the store.
        prop_assert!(snapshot_keys.len() <= keys.len());
        prop_assert_eq!(&keys[..snapshot_keys.len()], &snapshot_keys[..]);
    }
}
