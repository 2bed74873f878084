use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::{DefaultGuard, GuardMode};

/// A handle to a slot handed out by [`Pool::alloc()`][1], used to access the payload and to
/// return the slot to the pool via [`Pool::free()`][2].
///
/// A slot names a node by its index in the pool's arena. With [`Guarded`][3] nodes it also
/// carries the identity of the pool that issued it, which lets a pool refuse slots that belong
/// to a different pool instance.
///
/// Slots are `Copy`, just like the pointers they stand in for. Holding a slot does not keep
/// anything alive; using a slot after it has been freed is a caller bug that the pool reports as
/// [`Error::InvalidArgument`][4] where it can.
///
/// # LIFO reuse
///
/// The most recently freed slot is the next one handed out:
///
/// ```rust
/// use slot_pool::Pool;
///
/// let mut pool = Pool::<u32>::new();
///
/// let first = pool.alloc();
/// pool.free(first).unwrap();
///
/// let second = pool.alloc();
/// assert_eq!(first, second);
/// # pool.free(second).unwrap();
/// ```
///
/// [1]: crate::Pool::alloc
/// [2]: crate::Pool::free
/// [3]: crate::Guarded
/// [4]: crate::Error::InvalidArgument
pub struct Slot<T, G: GuardMode = DefaultGuard> {
    index: usize,
    owner: G::Owner,

    _item: PhantomData<fn() -> T>,
}

impl<T, G: GuardMode> Slot<T, G> {
    #[must_use]
    pub(crate) fn new(index: usize, owner: G::Owner) -> Self {
        Self {
            index,
            owner,
            _item: PhantomData,
        }
    }

    /// The index of the node in the arena of the pool that issued the slot.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub(crate) fn owner(&self) -> G::Owner {
        self.owner
    }
}

impl<T, G: GuardMode> Clone for Slot<T, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, G: GuardMode> Copy for Slot<T, G> {}

impl<T, G: GuardMode> PartialEq for Slot<T, G> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.owner == other.owner
    }
}

impl<T, G: GuardMode> Eq for Slot<T, G> {}

impl<T, G: GuardMode> Hash for Slot<T, G> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.owner.hash(state);
    }
}

impl<T, G: GuardMode> fmt::Debug for Slot<T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("index", &self.index)
            .field("owner", &self.owner)
            .finish()
    }
}
