// Public API types for the harnesses.
//
// The inputs are plain parameter sets filled in by the command line front end in main.rs.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use slot_profile::Report;

use crate::ThreadList;

/// File name that `compare` writes its report to unless told otherwise.
pub const DEFAULT_REPORT_PATH: &str = "profile_data.txt";

/// Parameters of the allocator comparison.
#[derive(Clone, Debug)]
#[allow(
    clippy::exhaustive_structs,
    reason = "plain parameter set, constructed field by field by the caller"
)]
pub struct CompareInput {
    /// Objects allocated per timed batch.
    pub count: usize,
    /// Timed batches per worker thread and phase.
    pub repeat: usize,
    /// Thread counts to run every phase with.
    pub threads: ThreadList,
    /// Where to write the report table.
    pub output: PathBuf,
}

/// The allocation strategy measured by one phase of the comparison.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Allocator {
    /// Every object is a separate `Box` from the global allocator.
    Box,
    /// Objects come from a per-thread `slot_pool::LocalPool`.
    Pool,
}

impl fmt::Display for Allocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Box => "box",
            Self::Pool => "pool",
        })
    }
}

/// Wall clock time of one comparison phase.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct PhaseTiming {
    /// Number of worker threads that ran the phase.
    pub threads: usize,
    /// The allocation strategy measured.
    pub allocator: Allocator,
    /// Time from starting the first worker until the last one finished.
    pub elapsed: Duration,
}

/// Result of a completed comparison.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct CompareOutcome {
    /// Every phase in the order it ran.
    pub phases: Vec<PhaseTiming>,
    /// Per-batch timings of all phases, also written to the output file.
    pub report: Report,
}

/// Parameters of the multi-threaded stress test.
#[derive(Clone, Debug)]
#[allow(
    clippy::exhaustive_structs,
    reason = "plain parameter set, constructed field by field by the caller"
)]
pub struct StressInput {
    /// Number of worker threads, each with its own pool.
    pub threads: usize,
    /// How long the workers keep going.
    pub duration: Duration,
    /// Slots each worker holds at once before freeing them all.
    pub batch: usize,
}

/// What one stress worker got done.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct WorkerSummary {
    /// Completed allocate, verify and free rounds.
    pub rounds: u64,
    /// Nodes the worker's pool tracked at the end.
    pub current_count: usize,
    /// Highest number of nodes the worker's pool ever tracked.
    pub max_count: usize,
}

/// Result of a stress test in which every check passed.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct StressOutcome {
    /// One entry per worker, in worker order.
    pub workers: Vec<WorkerSummary>,
}

/// Parameters of the single-threaded correctness check.
#[derive(Clone, Debug)]
#[allow(
    clippy::exhaustive_structs,
    reason = "plain parameter set, constructed field by field by the caller"
)]
pub struct CheckInput {
    /// Allocate and free cycles to run. The pool is prewarmed with this many nodes.
    pub count: usize,
}

/// Pool counters observed after a successful check.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct CheckOutcome {
    /// Nodes the pool tracked at the end.
    pub current_count: usize,
    /// Highest number of nodes the pool ever tracked.
    pub max_count: usize,
}
