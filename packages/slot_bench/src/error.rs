use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while running a harness.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A stress worker read a value other than the one it expected from one of its slots.
    #[error(
        "stress worker {worker} read {actual:#06x} during {step} where {expected:#06x} was expected"
    )]
    StressFailure {
        /// Index of the worker that saw the mismatch.
        worker: usize,
        /// Which step of the per-slot check failed.
        step: &'static str,
        /// The value the worker expected.
        expected: u32,
        /// The value the worker actually read.
        actual: u32,
    },

    /// A freshly allocated object was not in its default state.
    #[error("object allocated in iteration {iteration} holds {value:#x} instead of zero")]
    CheckFailure {
        /// Zero-based iteration of the check loop.
        iteration: usize,
        /// The value found in the object.
        value: u32,
    },

    /// The pool tracked a different number of nodes than it was prewarmed with.
    #[error(
        "pool prewarmed with {expected} nodes ended with current count {current} and max count {max}"
    )]
    CountMismatch {
        /// The prewarmed capacity, which is also the number of check iterations.
        expected: usize,
        /// Nodes the pool tracked at the end.
        current: usize,
        /// Highest number of nodes the pool ever tracked.
        max: usize,
    },

    /// The pool refused to take back a slot.
    #[error("pool rejected a slot: {0}")]
    Pool(#[from] slot_pool::Error),

    /// A worker thread panicked.
    #[error("worker thread {worker} panicked")]
    WorkerPanicked {
        /// Index of the worker that panicked.
        worker: usize,
    },

    /// The arguments describe a workload that cannot be run.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        /// What is wrong with the arguments.
        message: String,
    },

    /// The report file could not be written.
    #[error("failed to write report to {}", path.display())]
    Io {
        /// The file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, Error>;
