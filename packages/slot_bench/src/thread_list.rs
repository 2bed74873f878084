use std::fmt;
use std::num::NonZero;
use std::str::FromStr;

/// A comma-separated list of thread counts, such as `1,2,4,8`.
///
/// Every entry must be a positive integer. The order is preserved and duplicates are allowed.
///
/// # Examples
///
/// ```
/// use slot_bench::ThreadList;
///
/// let list: ThreadList = "1, 2,4".parse().unwrap();
///
/// assert_eq!(list.iter().collect::<Vec<_>>(), [1, 2, 4]);
/// assert!("1,0".parse::<ThreadList>().is_err());
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ThreadList {
    counts: Vec<NonZero<usize>>,
}

impl ThreadList {
    /// Creates a list from already validated thread counts.
    #[must_use]
    pub fn new(counts: Vec<NonZero<usize>>) -> Self {
        Self { counts }
    }

    /// Iterates over the thread counts in order.
    pub fn iter(&self) -> impl Iterator<Item = usize> {
        self.counts.iter().map(|count| count.get())
    }

    /// Number of entries in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl Default for ThreadList {
    /// The thread counts used when none are given: 1, 2, 4, 8 and 16.
    fn default() -> Self {
        Self::new(
            [1, 2, 4, 8, 16]
                .into_iter()
                .map(|count| NonZero::new(count).expect("constants are non-zero"))
                .collect(),
        )
    }
}

impl FromStr for ThreadList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let counts = s
            .split(',')
            .map(str::trim)
            .map(|entry| {
                entry
                    .parse::<NonZero<usize>>()
                    .map_err(|e| format!("invalid thread count '{entry}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(counts))
    }
}

impl fmt::Display for ThreadList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, count) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{count}")?;
        }

        Ok(())
    }
}
