use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use crate::{AutoConstruct, ConstructionPolicy, DefaultGuard, GuardMode, LocalPool, Pool, TeardownPolicy};

/// Builder for creating an instance of [`Pool`] or [`LocalPool`].
///
/// You only need to use this builder if you want to customize the pool configuration.
/// The default configuration used by [`Pool::new()`][1] is sufficient for most use cases.
///
/// The builder holds no pool state, so it can be cloned and sent to other threads, for example
/// to give every worker thread an identically configured [`LocalPool`].
///
/// # Examples
///
/// ```
/// use slot_pool::{Pool, TeardownPolicy};
///
/// let pool = Pool::<u32>::builder()
///     .initial_capacity(64)
///     .teardown_policy(TeardownPolicy::RequireAllFreed)
///     .build();
///
/// assert_eq!(pool.tracked_count(), 64);
/// ```
///
/// [1]: Pool::new
#[must_use]
pub struct PoolBuilder<T, C: ConstructionPolicy<T> = AutoConstruct, G: GuardMode = DefaultGuard> {
    initial_capacity: usize,
    teardown_policy: TeardownPolicy,

    _item: PhantomData<fn() -> (T, C, G)>,
}

impl<T, C: ConstructionPolicy<T>, G: GuardMode> PoolBuilder<T, C, G> {
    pub(crate) fn new() -> Self {
        Self {
            initial_capacity: 0,
            teardown_policy: TeardownPolicy::default(),
            _item: PhantomData,
        }
    }

    /// Sets the number of nodes created up front and placed on the free list.
    ///
    /// Prewarming never constructs any objects, it only creates the nodes. Defaults to zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::Pool;
    ///
    /// let pool = Pool::<u32>::builder().initial_capacity(1000).build();
    ///
    /// assert_eq!(pool.free_count(), 1000);
    /// ```
    pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Sets the [teardown policy][TeardownPolicy] for the pool. This governs how
    /// to treat slots that are still allocated when the pool is dropped.
    pub fn teardown_policy(mut self, policy: TeardownPolicy) -> Self {
        self.teardown_policy = policy;
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::Pool;
    ///
    /// let pool = Pool::<u32>::builder().build();
    /// ```
    #[must_use]
    pub fn build(self) -> Pool<T, C, G> {
        Pool::new_inner(self.initial_capacity, self.teardown_policy)
    }

    /// Builds a thread-local pool with the specified configuration.
    ///
    /// The pool itself is only created, and prewarmed, on first use.
    ///
    /// # Examples
    ///
    /// ```
    /// use slot_pool::Pool;
    ///
    /// let mut pool = Pool::<u32>::builder().initial_capacity(8).build_local();
    ///
    /// // Nothing has been created yet.
    /// assert_eq!(pool.current_count(), 0);
    ///
    /// let slot = pool.alloc();
    /// assert_eq!(pool.current_count(), 8);
    /// # pool.free(slot).unwrap();
    /// ```
    #[must_use]
    pub fn build_local(self) -> LocalPool<T, C, G> {
        LocalPool::from_builder(self)
    }
}

impl<T, C: ConstructionPolicy<T>, G: GuardMode> Clone for PoolBuilder<T, C, G> {
    fn clone(&self) -> Self {
        Self {
            initial_capacity: self.initial_capacity,
            teardown_policy: self.teardown_policy,
            _item: PhantomData,
        }
    }
}

impl<T, C: ConstructionPolicy<T>, G: GuardMode> fmt::Debug for PoolBuilder<T, C, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuilder")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("initial_capacity", &self.initial_capacity)
            .field("teardown_policy", &self.teardown_policy)
            .finish()
    }
}
