//! Timing reports.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::SampleStats;

const NAME_WIDTH: usize = 24;
const TIME_WIDTH: usize = 12;
const CALLS_WIDTH: usize = 8;
const SEPARATOR: &str = " | ";
const TABLE_WIDTH: usize = NAME_WIDTH + CALLS_WIDTH + TIME_WIDTH * 4 + SEPARATOR.len() * 5;

/// Snapshot of the timing statistics held by a [`Profiler`][crate::Profiler].
///
/// A report can be sent to other threads, merged with other reports and rendered as a text
/// table, either via [`Display`][fmt::Display] or straight into a file via
/// [`write_to()`][Self::write_to]. Labels are listed in lexicographic order.
///
/// The table has one row per label with these columns, all times in microseconds:
///
/// * `Average` - the [trimmed mean][SampleStats::trimmed_mean].
/// * `Calls` - number of samples.
/// * `Total` - sum of all samples.
/// * `Min` and `Max` - the fastest and slowest sample.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use slot_profile::Profiler;
///
/// let profiler = Profiler::new();
/// profiler.recorder().record("4 threads alloc 1000", Duration::from_micros(120));
///
/// let text = profiler.report().to_string();
///
/// assert!(text.starts_with("Name"));
/// assert!(text.contains("4 threads alloc 1000"));
/// assert!(text.contains("120.000000"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Report {
    entries: BTreeMap<String, SampleStats>,
}

impl Report {
    #[must_use]
    pub(crate) fn from_entries(entries: impl IntoIterator<Item = (String, SampleStats)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Merges two reports into a new report.
    ///
    /// Labels present in both have their statistics combined as if all samples had been
    /// recorded through a single profiler.
    #[must_use]
    pub fn merge(a: &Self, b: &Self) -> Self {
        let mut entries = a.entries.clone();

        for (label, stats) in &b.entries {
            entries
                .entry(label.clone())
                .and_modify(|existing| existing.merge(stats))
                .or_insert_with(|| stats.clone());
        }

        Self { entries }
    }

    /// Statistics recorded under `label`, if any.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&SampleStats> {
        self.entries.get(label)
    }

    /// Iterates over the labels and their statistics in lexicographic order of labels.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &SampleStats)> {
        self.entries
            .iter()
            .map(|(label, stats)| (label.as_str(), stats))
    }

    /// Number of labels in the report.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there is any recorded activity in this report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(|stats| stats.calls() == 0)
    }

    /// Writes the report table to a file, replacing the file if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();

        fs::write(path, self.to_string())?;

        debug!(path = %path.display(), labels = self.entries.len(), "wrote profile report");

        Ok(())
    }

    /// Prints the report table to stdout.
    ///
    /// Prints nothing if no samples were captured.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_to_stdout(&self) {
        if self.is_empty() {
            return;
        }
        print!("{self}");
    }
}

fn as_micros(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000_000.0
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<NAME_WIDTH$}{SEPARATOR}{:>TIME_WIDTH$}{SEPARATOR}{:>CALLS_WIDTH$}{SEPARATOR}{:>TIME_WIDTH$}{SEPARATOR}{:>TIME_WIDTH$}{SEPARATOR}{:>TIME_WIDTH$}",
            "Name", "Average", "Calls", "Total", "Min", "Max"
        )?;

        writeln!(f, "{}", "-".repeat(TABLE_WIDTH))?;

        for (label, stats) in &self.entries {
            writeln!(
                f,
                "{label:<NAME_WIDTH$}{SEPARATOR}{:>TIME_WIDTH$.6}{SEPARATOR}{:>CALLS_WIDTH$}{SEPARATOR}{:>TIME_WIDTH$.6}{SEPARATOR}{:>TIME_WIDTH$.6}{SEPARATOR}{:>TIME_WIDTH$.6}",
                as_micros(stats.trimmed_mean()),
                stats.calls(),
                as_micros(stats.total()),
                as_micros(stats.min().unwrap_or_default()),
                as_micros(stats.max().unwrap_or_default()),
            )?;
        }

        Ok(())
    }
}
