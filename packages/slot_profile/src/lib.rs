//! Wall-clock timing samples for benchmarks and performance analysis.
//!
//! This package measures how long labeled spans of code take, on any number of threads, and
//! consolidates the samples into one table that can be exported as text.
//!
//! The core functionality includes:
//! - [`Profiler`] - The global table that all threads merge their samples into
//! - [`ThreadRecorder`] - Records samples on one thread without synchronization
//! - [`ProfileSpan`] - Times a span of code from creation until drop
//! - [`SampleStats`] - Total, call count and the fastest and slowest samples of one label
//! - [`Report`] - A snapshot of the table, rendered as `Name | Average | Calls | Total | Min | Max`
//!
//! Averages exclude outliers: once a label has more than `2 * TOP_SAMPLES` calls, its
//! [`TOP_SAMPLES`] fastest and [`TOP_SAMPLES`] slowest samples are left out.
//!
//! This package is not meant for use in production, serving only as a development tool.
//!
//! # Simple Usage
//!
//! ```
//! use slot_profile::Profiler;
//!
//! let profiler = Profiler::new();
//!
//! {
//!     let recorder = profiler.recorder();
//!
//!     for _ in 0..100 {
//!         let _span = recorder.span("box alloc");
//!         drop(std::hint::black_box(Box::new(42_u64)));
//!     }
//! } // The recorder merges its samples into the profiler here.
//!
//! let report = profiler.report();
//! assert_eq!(report.get("box alloc").unwrap().calls(), 100);
//!
//! // Export the table, e.g. for plotting.
//! # let dir = tempfile::tempdir().unwrap();
//! # let path = dir.path().join("profile_data.txt");
//! report.write_to(&path).unwrap();
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod pal;
mod profiler;
mod report;
mod sample_stats;
mod span;
mod thread_recorder;

pub use profiler::Profiler;
pub use report::Report;
pub use sample_stats::{SampleStats, TOP_SAMPLES};
pub use span::ProfileSpan;
pub use thread_recorder::ThreadRecorder;

pub(crate) const ERR_POISONED_LOCK: &str = "poisoned lock - safe execution no longer possible";
