//! # pagefill testkit
//!
//! Testing utilities for pagefill.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a store, simulated remote and pager wired together
//! - **Scenarios**: canned request sequences with their expected final keys
//! - **Generators**: proptest strategies for configurations and request sequences
//!
//! ## Scenarios
//!
//! ```rust,ignore
//! use pagefill_testkit::scenarios::{all_scenarios, run_scenario};
//!
//! for scenario in all_scenarios() {
//!     let keys = run_scenario(&scenario).await?;
//!     assert_eq!(keys, scenario.expected_keys());
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use pagefill_testkit::generators::{paging_config, steps};
//!
//! proptest! {
//!     #[test]
//!     fn keys_stay_contiguous(config in paging_config(), steps in steps(12)) {
//!         // drive a TestFixture through `steps` and check the store
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod scenarios;

pub use fixtures::{TestFixture, TestPager};
pub use scenarios::{Scenario, Step};
