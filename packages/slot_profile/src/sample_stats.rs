use std::time::Duration;

/// How many of the fastest and of the slowest samples each label keeps.
///
/// When a label has more than twice this many calls, this many samples from each end are
/// treated as outliers and left out of the [trimmed mean][SampleStats::trimmed_mean].
pub const TOP_SAMPLES: usize = 20;

/// Accumulated timing samples for one label.
///
/// Besides the running total and call count, the statistics remember the [`TOP_SAMPLES`]
/// fastest and the [`TOP_SAMPLES`] slowest individual samples. Merging two sets of statistics
/// keeps the best of both sides, so the result is the same as if every sample had been
/// recorded into one set.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SampleStats {
    total: Duration,
    calls: u64,

    /// Ascending, at most `TOP_SAMPLES` entries.
    fastest: Vec<Duration>,

    /// Descending, at most `TOP_SAMPLES` entries.
    slowest: Vec<Duration>,
}

impl SampleStats {
    pub(crate) fn record(&mut self, elapsed: Duration) {
        self.total = self
            .total
            .checked_add(elapsed)
            .expect("accumulated time overflows Duration - this indicates an unrealistic scenario");

        self.calls = self
            .calls
            .checked_add(1)
            .expect("call count overflows u64 - this indicates an unrealistic scenario");

        insert_bounded(&mut self.fastest, elapsed, |existing, new| existing <= new);
        insert_bounded(&mut self.slowest, elapsed, |existing, new| existing >= new);
    }

    /// Combines the samples of `other` into `self`.
    pub(crate) fn merge(&mut self, other: &Self) {
        self.total = self
            .total
            .checked_add(other.total)
            .expect("merging accumulated times overflows Duration - this indicates an unrealistic scenario");

        self.calls = self
            .calls
            .checked_add(other.calls)
            .expect("merging call counts overflows u64 - this indicates an unrealistic scenario");

        for &sample in &other.fastest {
            insert_bounded(&mut self.fastest, sample, |existing, new| existing <= new);
        }

        for &sample in &other.slowest {
            insert_bounded(&mut self.slowest, sample, |existing, new| existing >= new);
        }
    }

    /// Total time across all samples.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Number of samples recorded.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// Fastest sample, if any was recorded.
    #[must_use]
    pub fn min(&self) -> Option<Duration> {
        self.fastest.first().copied()
    }

    /// Slowest sample, if any was recorded.
    #[must_use]
    pub fn max(&self) -> Option<Duration> {
        self.slowest.first().copied()
    }

    /// The fastest samples in ascending order, at most [`TOP_SAMPLES`] of them.
    #[must_use]
    pub fn fastest(&self) -> &[Duration] {
        &self.fastest
    }

    /// The slowest samples in descending order, at most [`TOP_SAMPLES`] of them.
    #[must_use]
    pub fn slowest(&self) -> &[Duration] {
        &self.slowest
    }

    /// Plain mean over all samples. Zero if nothing was recorded.
    #[must_use]
    pub fn mean(&self) -> Duration {
        divide(self.total, self.calls)
    }

    /// Mean with outliers removed.
    ///
    /// If there are more than `2 * TOP_SAMPLES` calls, the [`TOP_SAMPLES`] fastest and the
    /// [`TOP_SAMPLES`] slowest samples are excluded. Otherwise this is the plain
    /// [`mean()`][Self::mean].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use slot_profile::Profiler;
    ///
    /// let profiler = Profiler::new();
    ///
    /// {
    ///     let recorder = profiler.recorder();
    ///
    ///     // 20 fast outliers, 20 slow outliers and 10 typical samples.
    ///     for _ in 0..20 {
    ///         recorder.record("work", Duration::from_micros(1));
    ///         recorder.record("work", Duration::from_millis(100));
    ///     }
    ///     for _ in 0..10 {
    ///         recorder.record("work", Duration::from_micros(50));
    ///     }
    /// }
    ///
    /// let report = profiler.report();
    /// let work = report.get("work").unwrap();
    ///
    /// assert_eq!(work.trimmed_mean(), Duration::from_micros(50));
    /// ```
    #[must_use]
    pub fn trimmed_mean(&self) -> Duration {
        let trim_threshold = u64::try_from(TOP_SAMPLES)
            .expect("small constant fits in u64")
            .checked_mul(2)
            .expect("small constant fits in u64");

        if self.calls <= trim_threshold {
            return self.mean();
        }

        // With more calls than both ends hold together, the two ends are disjoint sets of samples.
        let outliers: Duration = self.fastest.iter().chain(self.slowest.iter()).sum();

        let remaining_time = self
            .total
            .checked_sub(outliers)
            .expect("outliers are a subset of all samples, so their sum cannot exceed the total");

        let remaining_calls = self
            .calls
            .checked_sub(trim_threshold)
            .expect("guarded by early return above");

        divide(remaining_time, remaining_calls)
    }
}

/// Inserts `sample` into a vector kept sorted by `keeps_position`, then drops whatever falls
/// beyond [`TOP_SAMPLES`].
fn insert_bounded(
    samples: &mut Vec<Duration>,
    sample: Duration,
    keeps_position: impl Fn(Duration, Duration) -> bool,
) {
    let position = samples.partition_point(|&existing| keeps_position(existing, sample));

    if position < TOP_SAMPLES {
        samples.insert(position, sample);
        samples.truncate(TOP_SAMPLES);
    }
}

fn divide(total: Duration, count: u64) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }

    Duration::from_nanos(
        total
            .as_nanos()
            .checked_div(u128::from(count))
            .expect("guarded by if condition")
            .try_into()
            .expect("all realistic values fit in u64"),
    )
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn micros(value: u64) -> Duration {
        Duration::from_micros(value)
    }

    #[test]
    fn empty_stats_are_zero() {
        let stats = SampleStats::default();

        assert_eq!(stats.calls(), 0);
        assert_eq!(stats.total(), Duration::ZERO);
        assert_eq!(stats.mean(), Duration::ZERO);
        assert_eq!(stats.trimmed_mean(), Duration::ZERO);
        assert_eq!(stats.min(), None);
        assert_eq!(stats.max(), None);
    }

    #[test]
    fn records_totals_and_extremes() {
        let mut stats = SampleStats::default();

        stats.record(micros(30));
        stats.record(micros(10));
        stats.record(micros(20));

        assert_eq!(stats.calls(), 3);
        assert_eq!(stats.total(), micros(60));
        assert_eq!(stats.mean(), micros(20));
        assert_eq!(stats.min(), Some(micros(10)));
        assert_eq!(stats.max(), Some(micros(30)));
        assert_eq!(stats.fastest(), &[micros(10), micros(20), micros(30)]);
        assert_eq!(stats.slowest(), &[micros(30), micros(20), micros(10)]);
    }

    #[test]
    fn extremes_are_bounded() {
        let mut stats = SampleStats::default();

        for value in 0..100 {
            stats.record(micros(value));
        }

        assert_eq!(stats.fastest().len(), TOP_SAMPLES);
        assert_eq!(stats.slowest().len(), TOP_SAMPLES);
        assert_eq!(stats.fastest().last(), Some(&micros(19)));
        assert_eq!(stats.slowest().last(), Some(&micros(80)));
    }

    #[test]
    fn small_sample_counts_are_not_trimmed() {
        let mut stats = SampleStats::default();

        for _ in 0..40 {
            stats.record(micros(10));
        }
        stats.record(micros(1000));

        // 41 calls: above the threshold, so trimming kicks in.
        assert_eq!(stats.trimmed_mean(), micros(10));

        let mut stats = SampleStats::default();

        for _ in 0..39 {
            stats.record(micros(10));
        }
        stats.record(micros(410));

        // 40 calls: not above the threshold, so this is the plain mean.
        assert_eq!(stats.trimmed_mean(), micros(20));
    }

    #[test]
    fn trimming_removes_both_ends() {
        let mut stats = SampleStats::default();

        for _ in 0..TOP_SAMPLES {
            stats.record(micros(1));
            stats.record(micros(1_000_000));
        }

        stats.record(micros(40));
        stats.record(micros(60));

        assert_eq!(stats.trimmed_mean(), micros(50));
    }

    #[test]
    fn merge_matches_single_recording() {
        let mut combined = SampleStats::default();
        let mut left = SampleStats::default();
        let mut right = SampleStats::default();

        for value in 0..60 {
            let sample = micros(value * 7 % 61);
            combined.record(sample);

            if value % 3 == 0 {
                left.record(sample);
            } else {
                right.record(sample);
            }
        }

        left.merge(&right);

        assert_eq!(left, combined);
    }

    #[test]
    fn merge_into_empty() {
        let mut target = SampleStats::default();
        let mut source = SampleStats::default();
        source.record(micros(5));

        target.merge(&source);

        assert_eq!(target, source);
    }
}
