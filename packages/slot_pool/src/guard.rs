use std::fmt::Debug;
use std::hash::Hash;
use std::num::NonZero;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Error, NodeGuards, Result, Sentinel};

/// The bit pattern stamped into both guard sentinels of every [`Guarded`] node.
pub(crate) const GUARD_VALUE: u64 = 0xAAAA_BBBB_CCCC_DDDD;

/// Selects the memory layout of the nodes in a pool and, with it, whether the pool can detect
/// misuse when a slot is freed.
///
/// There are exactly two implementations:
///
/// * [`Guarded`] - every node carries a front sentinel, an end sentinel and the identity of its
///   owning pool. Freeing a slot verifies all three before the node is recycled.
/// * [`Bare`] - the node is only the payload and its free list link. No checks are performed and
///   no memory is spent on them.
///
/// [`DefaultGuard`] picks [`Guarded`] in builds with debug assertions and [`Bare`] otherwise.
///
/// This trait is sealed and cannot be implemented outside this crate.
pub trait GuardMode: private::Sealed + Send + Sync + 'static {
    /// Type of the sentinel placed before the payload.
    type Front: Copy + Debug + Eq + Send + Sync;

    /// Type of the sentinel placed after the payload. Must have an alignment of 1 so that it
    /// starts at the first byte past the payload.
    type End: Copy + Debug + Eq + Send + Sync;

    /// Identity of a pool instance, as recorded in slots.
    type Owner: Copy + Debug + Eq + Hash + Send + Sync;

    /// The owner identity as stored inside a node. Stray writes may leave any bit pattern in it,
    /// so it is a plain integer that is valid for all of them.
    type Tag: Copy + Debug + Eq + Send + Sync;

    #[doc(hidden)]
    const FRONT: Self::Front;

    /// Stamped into every byte of alignment padding between the front sentinel and the payload.
    #[doc(hidden)]
    const FRONT_PADDING: u8;

    #[doc(hidden)]
    const END: Self::End;

    #[doc(hidden)]
    fn new_owner() -> Self::Owner;

    #[doc(hidden)]
    fn tag(owner: Self::Owner) -> Self::Tag;
}

/// Node layout with guard sentinels and owner tagging. See [`GuardMode`].
///
/// # Example
///
/// ```rust
/// use slot_pool::{AutoConstruct, Guarded, Pool};
///
/// // Guards can be requested explicitly, also in release builds.
/// let mut a = Pool::<u32, AutoConstruct, Guarded>::new();
/// let mut b = Pool::<u32, AutoConstruct, Guarded>::new();
///
/// let slot = a.alloc();
///
/// // The slot came from `a`, so `b` refuses it and stays untouched.
/// assert!(b.free(slot).is_err());
/// assert_eq!(b.tracked_count(), 0);
///
/// a.free(slot).unwrap();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Guarded;

/// Node layout without any guard data. See [`GuardMode`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Bare;

/// The node layout used when a pool does not name one explicitly.
#[cfg(debug_assertions)]
pub type DefaultGuard = Guarded;

/// The node layout used when a pool does not name one explicitly.
#[cfg(not(debug_assertions))]
pub type DefaultGuard = Bare;

/// Identity of one pool instance, unique within the process.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PoolIdentity(NonZero<u64>);

static NEXT_POOL_IDENTITY: AtomicU64 = AtomicU64::new(1);

impl PoolIdentity {
    #[must_use]
    fn next() -> Self {
        // Relaxed is enough: we only need every caller to observe a distinct value.
        let value = NEXT_POOL_IDENTITY.fetch_add(1, Ordering::Relaxed);

        Self(NonZero::new(value).expect(
            "pool identity counter starts at 1 and cannot realistically wrap around a u64",
        ))
    }
}

impl GuardMode for Guarded {
    type Front = u64;
    type End = [u8; 8];
    type Owner = PoolIdentity;
    type Tag = u64;

    const FRONT: u64 = GUARD_VALUE;
    const FRONT_PADDING: u8 = 0xAA;
    const END: [u8; 8] = GUARD_VALUE.to_ne_bytes();

    fn new_owner() -> PoolIdentity {
        PoolIdentity::next()
    }

    fn tag(owner: PoolIdentity) -> u64 {
        owner.0.get()
    }
}

impl GuardMode for Bare {
    type Front = ();
    type End = ();
    type Owner = ();
    type Tag = ();

    const FRONT: () = ();
    const FRONT_PADDING: u8 = 0;
    const END: () = ();

    fn new_owner() {}

    fn tag(_owner: ()) {}
}

/// Verifies that a slot was issued by the pool with identity `pool_owner`.
///
/// For [`Bare`] this compiles down to nothing.
pub(crate) fn verify_slot_owner<G: GuardMode>(
    index: usize,
    slot_owner: G::Owner,
    pool_owner: G::Owner,
) -> Result<()> {
    if slot_owner == pool_owner {
        Ok(())
    } else {
        Err(Error::ForeignPool { index })
    }
}

/// Verifies the guard data stored in a node: front sentinel (including any padding up to the
/// payload), end sentinel, owner tag - in that order, stopping at the first mismatch.
///
/// For [`Bare`] this compiles down to nothing.
pub(crate) fn verify_node_guards<G: GuardMode>(
    index: usize,
    guards: &NodeGuards<G>,
    pool_owner: G::Owner,
) -> Result<()> {
    if guards.front != G::FRONT || !guards.front_padding_intact {
        return Err(Error::CorruptionDetected {
            index,
            sentinel: Sentinel::Front,
        });
    }

    if guards.end != G::END {
        return Err(Error::CorruptionDetected {
            index,
            sentinel: Sentinel::End,
        });
    }

    if guards.tag != G::tag(pool_owner) {
        return Err(Error::ForeignPool { index });
    }

    Ok(())
}

mod private {
    pub trait Sealed {}

    impl Sealed for super::Guarded {}
    impl Sealed for super::Bare {}
}
