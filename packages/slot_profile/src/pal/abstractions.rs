//! Platform abstraction trait definitions.

use std::fmt::Debug;
use std::time::Duration;

/// Provides the monotonic clock that spans are timed with.
///
/// This trait abstracts the underlying clock, allowing for both the real implementation
/// (using `Instant`) and fake implementations (for testing).
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Time elapsed since an arbitrary origin fixed for the lifetime of the platform.
    ///
    /// Only the difference between two readings is meaningful.
    fn now(&self) -> Duration;
}
