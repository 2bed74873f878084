use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::mem;
use std::time::Duration;

use crate::{ProfileSpan, Profiler, SampleStats};

/// Records timing samples on one thread, without synchronization.
///
/// Samples accumulate in a table owned by the recorder and only reach the [`Profiler`] when the
/// recorder is [flushed][Self::flush] or dropped. Taking a sample therefore never contends with
/// other threads.
///
/// # Examples
///
/// ```
/// use slot_profile::Profiler;
///
/// let profiler = Profiler::new();
/// let recorder = profiler.recorder();
///
/// for _ in 0..3 {
///     let _span = recorder.span("sum");
///     std::hint::black_box((0..1000).sum::<u64>());
/// }
///
/// // Nothing is visible in the profiler until the recorder is flushed.
/// assert!(profiler.is_empty());
///
/// recorder.flush();
/// assert_eq!(profiler.report().get("sum").unwrap().calls(), 3);
/// ```
#[derive(Debug)]
pub struct ThreadRecorder {
    profiler: Profiler,
    local: RefCell<HashMap<String, SampleStats>>,

    _single_threaded: PhantomData<*const ()>,
}

impl ThreadRecorder {
    pub(crate) fn new(profiler: Profiler) -> Self {
        Self {
            profiler,
            local: RefCell::new(HashMap::new()),
            _single_threaded: PhantomData,
        }
    }

    /// Starts timing a span of code under `label`. The sample is taken when the span is dropped.
    pub fn span<'a>(&'a self, label: &'a str) -> ProfileSpan<'a> {
        ProfileSpan::new(self, label, self.profiler.platform())
    }

    /// Adds a sample measured by other means.
    pub fn record(&self, label: &str, elapsed: Duration) {
        let mut local = self.local.borrow_mut();

        if let Some(stats) = local.get_mut(label) {
            stats.record(elapsed);
        } else {
            local.entry(label.to_owned()).or_default().record(elapsed);
        }
    }

    /// Merges all locally recorded samples into the profiler and starts over with an empty table.
    pub fn flush(&self) {
        let local = mem::take(&mut *self.local.borrow_mut());

        if !local.is_empty() {
            self.profiler.absorb(&local);
        }
    }
}

impl Drop for ThreadRecorder {
    fn drop(&mut self) {
        self.flush();
    }
}
