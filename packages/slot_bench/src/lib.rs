#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Harnesses that exercise `slot_pool` under load.
//!
//! Three harnesses are provided, each exposed as a function taking a plain parameter set so
//! that they can be driven both by the `slot_bench` binary and by tests:
//!
//! - [`run_compare`] - times batches of heap allocations against batches of pool allocations
//!   on a growing number of threads and writes a `slot_profile` report.
//! - [`run_stress`] - keeps many threads churning their own pools for a while, checking on
//!   every slot that no two live slots share memory.
//! - [`run_check`] - a quick single-threaded pass that checks reuse and reports pool counters.
//!
//! # Example
//!
//! ```
//! use slot_bench::{CheckInput, run_check};
//!
//! let outcome = run_check(&CheckInput { count: 100 }).unwrap();
//!
//! assert_eq!(outcome.max_count, 100);
//! ```

mod comparison;
mod error;
mod sanity_check;
mod stress_test;
mod thread_list;
mod types;

pub use comparison::*;
pub use error::*;
pub use sanity_check::*;
pub use stress_test::*;
pub use thread_list::*;
pub use types::*;
