use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::pal::PlatformFacade;
use crate::{ERR_POISONED_LOCK, Report, SampleStats, ThreadRecorder};

/// The global table that timing samples from all threads are consolidated into.
///
/// Threads do not record into the profiler directly. Each thread obtains its own
/// [`ThreadRecorder`], records samples locally without any synchronization and merges them into
/// the profiler when the recorder is flushed or dropped. The profiler is cheap to clone; all
/// clones share the same table.
///
/// # Examples
///
/// ```
/// use std::thread;
///
/// use slot_profile::Profiler;
///
/// let profiler = Profiler::new();
///
/// let workers: Vec<_> = (0..4)
///     .map(|_| {
///         let profiler = profiler.clone();
///
///         thread::spawn(move || {
///             let recorder = profiler.recorder();
///
///             for _ in 0..10 {
///                 let _span = recorder.span("work");
///                 std::hint::black_box(42 * 2);
///             }
///             // The recorder is flushed when dropped.
///         })
///     })
///     .collect();
///
/// for worker in workers {
///     worker.join().unwrap();
/// }
///
/// let report = profiler.report();
/// assert_eq!(report.get("work").unwrap().calls(), 40);
/// ```
#[derive(Clone, Debug)]
pub struct Profiler {
    table: Arc<Mutex<HashMap<String, SampleStats>>>,
    platform: PlatformFacade,
}

impl Profiler {
    /// Creates a profiler with an empty table that times spans with the real monotonic clock.
    #[expect(
        clippy::new_without_default,
        reason = "to avoid ambiguity with the notion of a 'default profiler' shared by everyone"
    )]
    #[must_use]
    pub fn new() -> Self {
        Self::with_platform(PlatformFacade::real())
    }

    #[must_use]
    pub(crate) fn with_platform(platform: PlatformFacade) -> Self {
        Self {
            table: Arc::new(Mutex::new(HashMap::new())),
            platform,
        }
    }

    /// Creates a recorder for the current thread.
    ///
    /// A thread may own any number of recorders; each is flushed independently.
    pub fn recorder(&self) -> ThreadRecorder {
        ThreadRecorder::new(self.clone())
    }

    pub(crate) fn platform(&self) -> &PlatformFacade {
        &self.platform
    }

    /// Merges samples from a thread-local table into the global table.
    pub(crate) fn absorb(&self, local: &HashMap<String, SampleStats>) {
        let mut table = self.table.lock().expect(ERR_POISONED_LOCK);

        for (label, stats) in local {
            match table.get_mut(label) {
                Some(existing) => existing.merge(stats),
                None => {
                    table.insert(label.clone(), stats.clone());
                }
            }
        }

        trace!(labels = local.len(), "merged thread samples into profiler");
    }

    /// Takes a snapshot of everything flushed into the profiler so far.
    ///
    /// Samples still held by unflushed recorders are not included.
    #[must_use]
    pub fn report(&self) -> Report {
        let table = self.table.lock().expect(ERR_POISONED_LOCK);

        Report::from_entries(table.iter().map(|(label, stats)| (label.clone(), stats.clone())))
    }

    /// Discards all samples flushed into the profiler so far.
    pub fn reset(&self) {
        self.table.lock().expect(ERR_POISONED_LOCK).clear();
    }

    /// Whether any samples have been flushed into the profiler.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table
            .lock()
            .expect(ERR_POISONED_LOCK)
            .values()
            .all(|stats| stats.calls() == 0)
    }
}
