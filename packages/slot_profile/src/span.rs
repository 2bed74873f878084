use std::time::Duration;

use crate::ThreadRecorder;
use crate::pal::{Platform, PlatformFacade};

/// A span of code timed from creation until drop, recorded under a label.
///
/// Obtained from [`ThreadRecorder::span()`].
///
/// # Examples
///
/// ```
/// use slot_profile::Profiler;
///
/// let profiler = Profiler::new();
/// let recorder = profiler.recorder();
///
/// {
///     let _span = recorder.span("1 threads box alloc 1000");
///
///     for _ in 0..1000 {
///         drop(std::hint::black_box(Box::new(42_u32)));
///     }
/// } // The elapsed time is recorded here.
/// ```
#[derive(Debug)]
#[must_use = "Measurements are taken between creation and drop"]
pub struct ProfileSpan<'a> {
    recorder: &'a ThreadRecorder,
    label: &'a str,
    platform: &'a PlatformFacade,
    start: Duration,
}

impl<'a> ProfileSpan<'a> {
    pub(crate) fn new(
        recorder: &'a ThreadRecorder,
        label: &'a str,
        platform: &'a PlatformFacade,
    ) -> Self {
        Self {
            recorder,
            label,
            platform,
            start: platform.now(),
        }
    }

    #[must_use]
    fn elapsed(&self) -> Duration {
        self.platform.now().saturating_sub(self.start)
    }
}

impl Drop for ProfileSpan<'_> {
    fn drop(&mut self) {
        self.recorder.record(self.label, self.elapsed());
    }
}
