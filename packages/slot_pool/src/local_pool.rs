use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ptr::NonNull;

use tracing::debug;

use crate::{
    AutoConstruct, ConstructionPolicy, DefaultGuard, Error, GuardMode, Pool, PoolBuilder, RawSlot,
    Result, Slot,
};

/// A pool owned by a single thread, materialized on first use.
///
/// Each worker thread typically creates its own `LocalPool` from a shared [`PoolBuilder`]
/// configuration. Free nodes never move between threads: every thread recycles only the slots
/// it allocated itself. The inner [`Pool`] is only created, and prewarmed, when the first slot
/// is allocated, so threads that never allocate pay nothing.
///
/// Apart from the lazy creation, the contract of every operation is that of [`Pool`].
///
/// # Single-threaded Design
///
/// This type is neither [`Send`] nor [`Sync`].
///
/// # Example
///
/// ```rust
/// use std::thread;
///
/// use slot_pool::{Pool, RawSlot};
///
/// let builder = Pool::<u32, RawSlot>::builder().initial_capacity(4);
///
/// let workers: Vec<_> = (0..2)
///     .map(|_| {
///         let builder = builder.clone();
///
///         thread::spawn(move || {
///             let mut pool = builder.build_local();
///
///             let slot = pool.alloc();
///             pool.uninit_mut(slot).write(1);
///             pool.free(slot).unwrap();
///
///             pool.max_count()
///         })
///     })
///     .collect();
///
/// for worker in workers {
///     assert_eq!(worker.join().unwrap(), 4);
/// }
/// ```
pub struct LocalPool<T, C: ConstructionPolicy<T> = AutoConstruct, G: GuardMode = DefaultGuard> {
    builder: PoolBuilder<T, C, G>,

    inner: Option<Pool<T, C, G>>,

    _single_threaded: PhantomData<*const ()>,
}

impl<T, C: ConstructionPolicy<T>, G: GuardMode> LocalPool<T, C, G> {
    pub(crate) fn from_builder(builder: PoolBuilder<T, C, G>) -> Self {
        Self {
            builder,
            inner: None,
            _single_threaded: PhantomData,
        }
    }

    /// Creates a local pool with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Pool::builder().build_local()
    }

    /// Hands out a slot, creating the inner pool first if this is the first use.
    ///
    /// See [`Pool::alloc()`].
    #[must_use]
    pub fn alloc(&mut self) -> Slot<T, G> {
        self.materialize().alloc()
    }

    /// Returns a slot to the pool. See [`Pool::free()`].
    ///
    /// # Errors
    ///
    /// As [`Pool::free()`]. Before first use no slot can belong to this pool, so any slot is
    /// refused with [`Error::InvalidArgument`].
    pub fn free(&mut self, slot: Slot<T, G>) -> Result<()> {
        match &mut self.inner {
            Some(pool) => pool.free(slot),
            None => Err(Error::InvalidArgument {
                index: slot.index(),
            }),
        }
    }

    /// Number of nodes currently tracked by the pool, allocated plus free.
    #[must_use]
    pub fn current_count(&self) -> usize {
        self.inner.as_ref().map_or(0, Pool::tracked_count)
    }

    /// Historical high-water mark of [`current_count()`][Self::current_count].
    #[must_use]
    pub fn max_count(&self) -> usize {
        self.inner.as_ref().map_or(0, Pool::max_tracked_count)
    }

    /// See [`Pool::allocated_count()`].
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.inner.as_ref().map_or(0, Pool::allocated_count)
    }

    /// See [`Pool::max_allocated_count()`].
    #[must_use]
    pub fn max_allocated_count(&self) -> usize {
        self.inner.as_ref().map_or(0, Pool::max_allocated_count)
    }

    /// See [`Pool::free_count()`].
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.inner.as_ref().map_or(0, Pool::free_count)
    }

    /// Whether the inner pool has been created yet.
    #[must_use]
    pub fn is_materialized(&self) -> bool {
        self.inner.is_some()
    }

    /// Pointer to the payload of an allocated slot. See [`Pool::as_ptr()`].
    ///
    /// # Panics
    ///
    /// Panics if the slot is not allocated from this pool.
    #[must_use]
    pub fn as_ptr(&self, slot: Slot<T, G>) -> NonNull<T> {
        self.materialized().as_ptr(slot)
    }

    /// See [`Pool::integrity_check()`]. A pool that was never used is trivially consistent.
    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    pub fn integrity_check(&self) {
        if let Some(pool) = &self.inner {
            pool.integrity_check();
        }
    }

    fn materialize(&mut self) -> &mut Pool<T, C, G> {
        self.inner.get_or_insert_with(|| {
            debug!(
                item_type = type_name::<T>(),
                "materializing thread-local slot pool"
            );

            self.builder.clone().build()
        })
    }

    fn materialized(&self) -> &Pool<T, C, G> {
        self.inner.as_ref().unwrap_or_else(|| {
            panic!(
                "no slot can be allocated from a local pool of {} that was never used",
                type_name::<T>()
            )
        })
    }

    fn materialized_mut(&mut self) -> &mut Pool<T, C, G> {
        self.inner.as_mut().unwrap_or_else(|| {
            panic!(
                "no slot can be allocated from a local pool of {} that was never used",
                type_name::<T>()
            )
        })
    }
}

impl<T: Default, G: GuardMode> LocalPool<T, AutoConstruct, G> {
    /// See [`Pool::get()`].
    ///
    /// # Panics
    ///
    /// Panics if the slot is not allocated from this pool.
    #[must_use]
    pub fn get(&self, slot: Slot<T, G>) -> &T {
        self.materialized().get(slot)
    }

    /// See [`Pool::get_mut()`].
    ///
    /// # Panics
    ///
    /// Panics if the slot is not allocated from this pool.
    #[must_use]
    pub fn get_mut(&mut self, slot: Slot<T, G>) -> &mut T {
        self.materialized_mut().get_mut(slot)
    }
}

impl<T, G: GuardMode> LocalPool<T, RawSlot, G> {
    /// See [`Pool::uninit_mut()`].
    ///
    /// # Panics
    ///
    /// Panics if the slot is not allocated from this pool.
    #[must_use]
    pub fn uninit_mut(&mut self, slot: Slot<T, G>) -> &mut MaybeUninit<T> {
        self.materialized_mut().uninit_mut(slot)
    }
}

impl<T, C: ConstructionPolicy<T>, G: GuardMode> Default for LocalPool<T, C, G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: ConstructionPolicy<T>, G: GuardMode> fmt::Debug for LocalPool<T, C, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalPool")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("builder", &self.builder)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
