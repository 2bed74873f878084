use std::fmt;

use thiserror::Error;

/// Errors returned when a slot cannot be returned to a pool.
///
/// A failed [`free()`][1] never modifies the pool: the free list, the counts and the node that
/// the slot refers to are all left exactly as they were.
///
/// Running out of memory is not represented here. Growing a pool that cannot obtain memory is
/// fatal and goes through [`std::alloc::handle_alloc_error()`].
///
/// [1]: crate::Pool::free
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The slot does not refer to a currently allocated node of the pool. Either the node was
    /// never created by this pool or the slot was already freed.
    #[error("slot {index} does not refer to an allocated node of this pool")]
    InvalidArgument {
        /// Arena index carried by the rejected slot.
        index: usize,
    },

    /// A guard sentinel next to the payload no longer holds the expected value, which means
    /// something wrote past the bounds of the payload.
    ///
    /// Only detected by pools that use [`Guarded`][crate::Guarded] nodes.
    #[error("{sentinel} guard sentinel of slot {index} was overwritten")]
    CorruptionDetected {
        /// Arena index carried by the rejected slot.
        index: usize,

        /// Which of the two sentinels failed the check. The front sentinel is checked first.
        sentinel: Sentinel,
    },

    /// The slot was handed out by a different pool instance.
    ///
    /// Only detected by pools that use [`Guarded`][crate::Guarded] nodes.
    #[error("slot {index} belongs to a different pool")]
    ForeignPool {
        /// Arena index carried by the rejected slot.
        index: usize,
    },
}

/// Identifies one of the two guard sentinels flanking a payload.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Sentinel {
    /// The sentinel placed immediately before the payload (detects underruns).
    Front,

    /// The sentinel placed immediately after the payload (detects overruns).
    End,
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Front => write!(f, "front"),
            Self::End => write!(f, "end"),
        }
    }
}

/// A specialized `Result` type for pool operations, returning the crate's [`Error`] type as the
/// error value.
pub type Result<T> = std::result::Result<T, Error>;
