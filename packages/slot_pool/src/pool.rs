use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ptr::NonNull;
use std::thread;

use num_integer::Integer;
use tracing::{debug, trace, warn};

use crate::guard::{verify_node_guards, verify_slot_owner};
use crate::{
    AutoConstruct, ConstructionPolicy, DefaultGuard, Error, GuardMode, Node, NodeSlab, NodeState,
    PoolBuilder, RawSlot, Result, Slot, TeardownPolicy,
};

/// An object pool for values of a single type `T` that recycles slots through a LIFO free list.
///
/// Allocating a slot pops the most recently freed node off the free list, creating a new node
/// only when the free list is empty. Freeing a slot pushes its node back. Nodes are never
/// released individually - the memory of every node the pool ever created is returned only when
/// the pool itself is dropped. Both operations are O(1) and never block.
///
/// The pool is configured at the type level:
///
/// * `C` - the [construction policy][ConstructionPolicy]: [`AutoConstruct`] (the default)
///   constructs `T::default()` on [`alloc()`][1] and drops it on [`free()`][2], whereas
///   [`RawSlot`] hands out uninitialized storage.
/// * `G` - the [guard mode][GuardMode]: [`Guarded`][3] nodes carry sentinels and an owner tag
///   that [`free()`][2] verifies, [`Bare`][4] nodes carry nothing. Defaults to [`DefaultGuard`],
///   which is [`Guarded`][3] only in builds with debug assertions.
///
/// # Debug and release builds behave differently
///
/// With [`Guarded`][3] nodes, freeing a slot that another pool issued or whose payload
/// neighborhood was overwritten is refused with an error and leaves the pool untouched. With
/// [`Bare`][4] nodes these checks do not exist: freeing a slot of another pool is a precondition
/// violation whose outcome is unspecified (though memory-safe), and writes outside the payload
/// through out-of-band pointers are undefined behavior. Slots that do not refer to an allocated
/// node of the pool at all are refused in every configuration.
///
/// # Out of band access
///
/// [`as_ptr()`][5] returns a pointer to the payload of an allocated slot. The pointer stays valid
/// until the slot is freed or the pool is dropped - nodes never move. The pool does not create
/// references to payloads unless you ask for one via [`get()`][6], [`get_mut()`][7] or
/// [`uninit_mut()`][8], so you may access payloads through such pointers from unsafe code as long
/// as you do not concurrently ask the pool for a conflicting reference.
///
/// # Thread safety
///
/// The pool performs no synchronization. It can be moved to another thread (if `T` can) but not
/// shared between threads. For per-thread use see [`LocalPool`][9].
///
/// # Example
///
/// ```rust
/// use slot_pool::Pool;
///
/// let mut pool = Pool::<u32>::new();
///
/// let slot = pool.alloc();
/// *pool.get_mut(slot) = 42;
/// assert_eq!(*pool.get(slot), 42);
///
/// pool.free(slot).unwrap();
///
/// // The node stays with the pool, ready for reuse.
/// assert_eq!(pool.tracked_count(), 1);
/// assert_eq!(pool.allocated_count(), 0);
/// ```
///
/// [1]: Self::alloc
/// [2]: Self::free
/// [3]: crate::Guarded
/// [4]: crate::Bare
/// [5]: Self::as_ptr
/// [6]: Self::get
/// [7]: Self::get_mut
/// [8]: Self::uninit_mut
/// [9]: crate::LocalPool
pub struct Pool<T, C: ConstructionPolicy<T> = AutoConstruct, G: GuardMode = DefaultGuard> {
    /// The slabs that provide the storage of the pool. Only the last slab may have room for more
    /// nodes. Slabs are never removed while the pool exists.
    slabs: Vec<NodeSlab<T, G, SLAB_CAPACITY>>,

    /// Arena index of the first node on the free list. The rest of the list is linked through the
    /// node states.
    free_head: Option<usize>,

    /// Number of nodes ever created by this pool. Freeing a slot does not change this.
    tracked: usize,
    max_tracked: usize,

    /// Number of slots handed out and not yet freed.
    allocated: usize,
    max_allocated: usize,

    identity: G::Owner,

    teardown_policy: TeardownPolicy,

    _construction: PhantomData<C>,
}

/// Nodes per slab. Kept private so that slab sizing can change without affecting the API.
#[cfg(not(miri))]
const SLAB_CAPACITY: usize = 128;

// Small slabs keep Miri runs fast while still exercising growth across slabs.
#[cfg(miri)]
const SLAB_CAPACITY: usize = 4;

impl<T, C: ConstructionPolicy<T>, G: GuardMode> Pool<T, C, G> {
    #[must_use]
    pub(crate) fn new_inner(initial_capacity: usize, teardown_policy: TeardownPolicy) -> Self {
        let mut pool = Self {
            slabs: Vec::new(),
            free_head: None,
            tracked: 0,
            max_tracked: 0,
            allocated: 0,
            max_allocated: 0,
            identity: G::new_owner(),
            teardown_policy,
            _construction: PhantomData,
        };

        if initial_capacity > 0 {
            for _ in 0..initial_capacity {
                pool.grow();
            }

            debug!(
                item_type = type_name::<T>(),
                initial_capacity, "prewarmed slot pool"
            );
        }

        pool
    }

    /// Creates an empty pool with the default configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::Pool;
    ///
    /// let pool = Pool::<u64>::new();
    ///
    /// assert_eq!(pool.tracked_count(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a pool whose free list is prewarmed with `initial_capacity` nodes.
    ///
    /// The prewarmed nodes are tracked immediately even though none of them are handed out yet.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::Pool;
    ///
    /// let pool = Pool::<u64>::with_capacity(1000);
    ///
    /// assert_eq!(pool.tracked_count(), 1000);
    /// assert_eq!(pool.free_count(), 1000);
    /// assert_eq!(pool.allocated_count(), 0);
    /// ```
    #[must_use]
    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self::builder().initial_capacity(initial_capacity).build()
    }

    /// Starts building a new [`Pool`].
    ///
    /// Use this when you want to customize the pool configuration beyond the defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::{Pool, TeardownPolicy};
    ///
    /// let pool = Pool::<u32>::builder()
    ///     .initial_capacity(16)
    ///     .teardown_policy(TeardownPolicy::RequireAllFreed)
    ///     .build();
    ///
    /// assert_eq!(pool.tracked_count(), 16);
    /// ```
    pub fn builder() -> PoolBuilder<T, C, G> {
        PoolBuilder::new()
    }

    /// Hands out a slot, reusing the most recently freed node if there is one.
    ///
    /// Under [`AutoConstruct`] the payload holds a freshly constructed `T::default()` when this
    /// returns. Under [`RawSlot`] the payload is uninitialized.
    ///
    /// If the pool needs more memory and the system cannot provide it, the process is aborted via
    /// [`std::alloc::handle_alloc_error()`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::Pool;
    ///
    /// let mut pool = Pool::<Vec<u8>>::new();
    ///
    /// let slot = pool.alloc();
    /// assert!(pool.get(slot).is_empty());
    /// assert_eq!(pool.tracked_count(), 1);
    /// # pool.free(slot).unwrap();
    /// ```
    #[must_use]
    pub fn alloc(&mut self) -> Slot<T, G> {
        let index = match self.free_head {
            Some(index) => index,
            None => self.grow(),
        };

        let node = self
            .created_node(index)
            .expect("free list only ever links nodes created by this pool");

        // SAFETY: The node was created by this pool, see above.
        let NodeState::Free { next } = (unsafe { Node::state(node) }) else {
            panic!(
                "node {index} at the head of the free list is not free in pool of {}",
                type_name::<T>()
            );
        };

        // We construct before unlinking the node, so if the constructor panics the node simply
        // stays on the free list.
        //
        // SAFETY: The node is free, so nobody else can hold a reference to its payload.
        C::construct(unsafe { Node::payload(node).as_mut() });

        self.free_head = next;

        // SAFETY: The node was created by this pool and we hold no reference to its state.
        unsafe { Node::set_state(node, NodeState::Allocated) };

        self.allocated = self
            .allocated
            .checked_add(1)
            .expect("cannot have more allocated slots than created nodes, which fit in usize");
        self.max_allocated = self.max_allocated.max(self.allocated);

        Slot::new(index, self.identity)
    }

    /// Returns a slot to the pool, pushing its node onto the free list.
    ///
    /// Under [`AutoConstruct`] the payload is dropped in place first. Under [`RawSlot`] the
    /// payload is left as is - any cleanup is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// The pool is left completely unmodified if any of the following checks fail, in order:
    ///
    /// 1. With [`Guarded`][1] nodes, the slot must have been issued by this pool instance
    ///    ([`Error::ForeignPool`]).
    /// 2. The slot must refer to a node created by this pool ([`Error::InvalidArgument`]).
    /// 3. With [`Guarded`][1] nodes, the front sentinel and then the end sentinel of the node must
    ///    be intact ([`Error::CorruptionDetected`]).
    /// 4. With [`Guarded`][1] nodes, the owner tag of the node must name this pool
    ///    ([`Error::ForeignPool`]).
    /// 5. The node must currently be allocated, i.e. not already freed
    ///    ([`Error::InvalidArgument`]).
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::{Error, Pool};
    ///
    /// let mut pool = Pool::<u32>::new();
    ///
    /// let slot = pool.alloc();
    /// pool.free(slot).unwrap();
    ///
    /// // Freeing the same slot twice is refused.
    /// assert!(matches!(pool.free(slot), Err(Error::InvalidArgument { .. })));
    /// ```
    ///
    /// [1]: crate::Guarded
    pub fn free(&mut self, slot: Slot<T, G>) -> Result<()> {
        let result = self.release(slot);

        if let Err(error) = &result {
            warn!(
                item_type = type_name::<T>(),
                %error,
                "refused to free slot"
            );
        }

        result
    }

    fn release(&mut self, slot: Slot<T, G>) -> Result<()> {
        let index = slot.index();

        verify_slot_owner::<G>(index, slot.owner(), self.identity)?;

        let node = self
            .created_node(index)
            .ok_or(Error::InvalidArgument { index })?;

        // SAFETY: The node was created by this pool.
        let guards = unsafe { Node::guards(node) };
        verify_node_guards::<G>(index, &guards, self.identity)?;

        // SAFETY: The node was created by this pool.
        if unsafe { Node::state(node) } != NodeState::Allocated {
            return Err(Error::InvalidArgument { index });
        }

        // We put the node back on the free list before destructing the payload. If the destructor
        // panics, the pool stays consistent and the payload is never dropped a second time.
        //
        // SAFETY: The node was created by this pool and we hold no reference to its state.
        unsafe {
            Node::set_state(
                node,
                NodeState::Free {
                    next: self.free_head,
                },
            );
        }
        self.free_head = Some(index);

        self.allocated = self
            .allocated
            .checked_sub(1)
            .expect("we verified above that the node was allocated, so the count is non-zero");

        // SAFETY: The node was allocated, so under a constructing policy its payload was
        // constructed by `alloc()` and not destructed since. We hold `&mut self`, so no
        // reference to the payload handed out by this pool can be alive.
        unsafe { C::destruct(Node::payload(node).as_mut()) };

        Ok(())
    }

    /// Number of nodes tracked by the pool: the allocated ones plus the ones on the free list.
    ///
    /// This only ever grows - it counts every node the pool created, whether during prewarming or
    /// on demand. Freeing a slot does not change it.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.tracked
    }

    /// Highest value [`tracked_count()`][Self::tracked_count] has ever had.
    ///
    /// Nodes are only released when the pool is dropped, so this currently always equals the
    /// tracked count; it is kept as a separate figure for capacity tuning reports.
    #[must_use]
    pub fn max_tracked_count(&self) -> usize {
        self.max_tracked
    }

    /// Number of slots handed out and not yet freed.
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.allocated
    }

    /// Highest number of slots that were allocated at the same time.
    #[must_use]
    pub fn max_allocated_count(&self) -> usize {
        self.max_allocated
    }

    /// Length of the free list.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.tracked
            .checked_sub(self.allocated)
            .expect("allocated nodes are a subset of tracked nodes")
    }

    /// Whether `slot` refers to a node of this pool that is currently allocated.
    #[must_use]
    pub fn is_allocated(&self, slot: Slot<T, G>) -> bool {
        self.allocated_node(slot).is_some()
    }

    /// Pointer to the payload of an allocated slot.
    ///
    /// The pointer is valid until the slot is freed or the pool is dropped. Under [`RawSlot`] the
    /// payload may be uninitialized.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::Pool;
    ///
    /// let mut pool = Pool::<u32>::new();
    ///
    /// let slot = pool.alloc();
    /// let ptr = pool.as_ptr(slot);
    ///
    /// // SAFETY: The slot is allocated and we create no conflicting references.
    /// unsafe { ptr.write(7) };
    /// assert_eq!(*pool.get(slot), 7);
    /// # pool.free(slot).unwrap();
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the slot is not allocated from this pool.
    #[must_use]
    pub fn as_ptr(&self, slot: Slot<T, G>) -> NonNull<T> {
        self.allocated_payload(slot).cast()
    }

    /// Walks all internal bookkeeping and panics if any of it is inconsistent: the free list must
    /// be acyclic, terminate, contain only free nodes and be as long as the tracked count minus
    /// the allocated count.
    ///
    /// This is O(n) in the number of tracked nodes and meant for tests and debugging.
    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    pub fn integrity_check(&self) {
        let created: usize = self.slabs.iter().map(NodeSlab::created).sum();
        assert_eq!(
            created,
            self.tracked,
            "slabs hold {created} nodes but the pool tracks {} in pool of {}",
            self.tracked,
            type_name::<T>()
        );

        let mut free_list_length: usize = 0;
        let mut cursor = self.free_head;

        while let Some(index) = cursor {
            assert!(
                free_list_length < self.tracked,
                "free list is longer than the number of tracked nodes, so it has a cycle in pool of {}",
                type_name::<T>()
            );

            let node = self.created_node(index).unwrap_or_else(|| {
                panic!(
                    "free list links to node {index} which was never created in pool of {}",
                    type_name::<T>()
                )
            });

            // SAFETY: The node was created by this pool.
            let NodeState::Free { next } = (unsafe { Node::state(node) }) else {
                panic!(
                    "free list links to node {index} which is allocated in pool of {}",
                    type_name::<T>()
                );
            };

            free_list_length = free_list_length
                .checked_add(1)
                .expect("guarded by the cycle assertion above");
            cursor = next;
        }

        assert_eq!(
            free_list_length,
            self.free_count(),
            "free list length does not match tracked minus allocated in pool of {}",
            type_name::<T>()
        );

        let observed_allocated = (0..self.tracked)
            .filter(|&index| {
                let node = self
                    .created_node(index)
                    .expect("every index below the tracked count is a created node");

                // SAFETY: The node was created by this pool.
                unsafe { Node::state(node) == NodeState::Allocated }
            })
            .count();

        assert_eq!(
            observed_allocated,
            self.allocated,
            "allocated count does not match the node states in pool of {}",
            type_name::<T>()
        );
    }

    /// Creates one node and pushes it onto the free list, returning its arena index.
    fn grow(&mut self) -> usize {
        let needs_slab = self.slabs.last().is_none_or(NodeSlab::is_full);

        if needs_slab {
            self.slabs.push(NodeSlab::new());

            trace!(
                item_type = type_name::<T>(),
                slabs = self.slabs.len(),
                "added slab to slot pool"
            );
        }

        let slab_index = self
            .slabs
            .len()
            .checked_sub(1)
            .expect("we just ensured there is at least one slab");

        let slab = self
            .slabs
            .get_mut(slab_index)
            .expect("we just ensured the slab exists");

        let index_in_slab = slab.create_node(self.identity);
        let node = slab.node_ptr(index_in_slab);

        // SAFETY: The node was just created and we hold no reference to its state.
        unsafe {
            Node::set_state(
                node,
                NodeState::Free {
                    next: self.free_head,
                },
            );
        }

        let index = NodeCoordinates::<SLAB_CAPACITY>::from_parts(slab_index, index_in_slab).to_index();
        self.free_head = Some(index);

        self.tracked = self
            .tracked
            .checked_add(1)
            .expect("node count cannot exceed usize because every node occupies memory");
        self.max_tracked = self.max_tracked.max(self.tracked);

        index
    }

    /// Pointer to the node at `index`, if this pool ever created such a node.
    #[must_use]
    fn created_node(&self, index: usize) -> Option<NonNull<Node<T, G>>> {
        if index >= self.tracked {
            return None;
        }

        let coordinates = NodeCoordinates::<SLAB_CAPACITY>::from_index(index);

        self.slabs
            .get(coordinates.slab_index)
            .map(|slab| slab.node_ptr(coordinates.index_in_slab))
    }

    /// Pointer to the node of `slot`, if the slot refers to an allocated node of this pool.
    #[must_use]
    fn allocated_node(&self, slot: Slot<T, G>) -> Option<NonNull<Node<T, G>>> {
        if slot.owner() != self.identity {
            return None;
        }

        let node = self.created_node(slot.index())?;

        // SAFETY: The node was created by this pool.
        (unsafe { Node::state(node) } == NodeState::Allocated).then_some(node)
    }

    #[must_use]
    fn allocated_payload(&self, slot: Slot<T, G>) -> NonNull<MaybeUninit<T>> {
        let node = self.allocated_node(slot).unwrap_or_else(|| {
            panic!(
                "slot {} is not allocated from this pool of {}",
                slot.index(),
                type_name::<T>()
            )
        });

        // SAFETY: The node was created by this pool.
        unsafe { Node::payload(node) }
    }
}

impl<T: Default, G: GuardMode> Pool<T, AutoConstruct, G> {
    /// Shared reference to the object in an allocated slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is not allocated from this pool.
    #[must_use]
    pub fn get(&self, slot: Slot<T, G>) -> &T {
        let payload = self.allocated_payload(slot);

        // SAFETY: Under `AutoConstruct`, allocated payloads are always initialized. Creating
        // references only through `&self`/`&mut self` keeps them from conflicting.
        unsafe { payload.as_ref().assume_init_ref() }
    }

    /// Exclusive reference to the object in an allocated slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is not allocated from this pool.
    #[must_use]
    pub fn get_mut(&mut self, slot: Slot<T, G>) -> &mut T {
        let mut payload = self.allocated_payload(slot);

        // SAFETY: Under `AutoConstruct`, allocated payloads are always initialized. We hold
        // `&mut self`, so no other reference handed out by the pool can be alive.
        unsafe { payload.as_mut().assume_init_mut() }
    }
}

impl<T, G: GuardMode> Pool<T, RawSlot, G> {
    /// Exclusive reference to the possibly uninitialized payload of an allocated slot.
    ///
    /// Whatever is written here is never dropped by the pool.
    ///
    /// # Panics
    ///
    /// Panics if the slot is not allocated from this pool.
    #[must_use]
    pub fn uninit_mut(&mut self, slot: Slot<T, G>) -> &mut MaybeUninit<T> {
        let mut payload = self.allocated_payload(slot);

        // SAFETY: We hold `&mut self`, so no other reference handed out by the pool can be alive.
        // `MaybeUninit` makes no claims about the contents.
        unsafe { payload.as_mut() }
    }
}

impl<T, C: ConstructionPolicy<T>, G: GuardMode> Default for Pool<T, C, G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: ConstructionPolicy<T>, G: GuardMode> Drop for Pool<T, C, G> {
    fn drop(&mut self) {
        if self.allocated == 0 {
            return;
        }

        let outstanding = self.allocated;

        // We release the memory first. The objects in outstanding slots are abandoned, never
        // dropped, whatever the policy says.
        self.slabs.clear();

        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if self.teardown_policy == TeardownPolicy::RequireAllFreed && !thread::panicking() {
            panic!(
                "dropped a pool of {} with {outstanding} outstanding slots under a policy that requires all slots to be freed",
                type_name::<T>()
            );
        }

        warn!(
            item_type = type_name::<T>(),
            outstanding, "dropped slot pool with outstanding slots; their payloads are abandoned"
        );
    }
}

impl<T, C: ConstructionPolicy<T>, G: GuardMode> fmt::Debug for Pool<T, C, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("constructs", &C::CONSTRUCTS)
            .field("identity", &self.identity)
            .field("tracked", &self.tracked)
            .field("allocated", &self.allocated)
            .field("free_head", &self.free_head)
            .field("teardown_policy", &self.teardown_policy)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug)]
struct NodeCoordinates<const SLAB_CAPACITY: usize> {
    slab_index: usize,
    index_in_slab: usize,
}

impl<const SLAB_CAPACITY: usize> NodeCoordinates<SLAB_CAPACITY> {
    #[must_use]
    fn from_parts(slab_index: usize, index_in_slab: usize) -> Self {
        Self {
            slab_index,
            index_in_slab,
        }
    }

    #[must_use]
    fn from_index(index: usize) -> Self {
        let (slab_index, index_in_slab) = index.div_rem(&SLAB_CAPACITY);

        Self {
            slab_index,
            index_in_slab,
        }
    }

    #[must_use]
    fn to_index(self) -> usize {
        self.slab_index
            .checked_mul(SLAB_CAPACITY)
            .and_then(|x| x.checked_add(self.index_in_slab))
            .expect("node index beyond the range of virtual memory - impossible to reach from a valid history")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(
        clippy::indexing_slicing,
        reason = "we do not need to worry about these things when writing test code"
    )]

    use std::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::{Bare, Guarded, Sentinel};

    type GuardedPool<T> = Pool<T, AutoConstruct, Guarded>;
    type BarePool<T> = Pool<T, AutoConstruct, Bare>;

    assert_impl_all!(Pool<u32>: Send);
    assert_not_impl_any!(Pool<u32>: Sync);
    assert_not_impl_any!(Pool<Rc<u32>>: Send, Sync);

    #[test]
    fn smoke_test() {
        let mut pool = GuardedPool::<u32>::new();

        let a = pool.alloc();
        let b = pool.alloc();
        let c = pool.alloc();

        *pool.get_mut(a) = 42;
        *pool.get_mut(b) = 43;
        *pool.get_mut(c) = 44;

        assert_eq!(*pool.get(a), 42);
        assert_eq!(*pool.get(b), 43);
        assert_eq!(*pool.get(c), 44);

        pool.free(b).unwrap();

        let d = pool.alloc();
        assert_eq!(d, b);
        assert_eq!(*pool.get(d), 0);

        assert_eq!(pool.tracked_count(), 3);
        assert_eq!(pool.allocated_count(), 3);

        pool.integrity_check();

        pool.free(a).unwrap();
        pool.free(c).unwrap();
        pool.free(d).unwrap();

        pool.integrity_check();
    }

    #[test]
    fn single_value_scenario() {
        let mut pool = Pool::<u32, RawSlot, Guarded>::with_capacity(0);

        let first = pool.alloc();
        let first_ptr = pool.as_ptr(first);

        pool.free(first).unwrap();

        assert_eq!(pool.max_tracked_count(), 1);
        assert_eq!(pool.tracked_count(), 1);

        let second = pool.alloc();
        assert_eq!(pool.as_ptr(second), first_ptr);
        assert_eq!(second, first);

        pool.free(second).unwrap();
    }

    #[test]
    fn lifo_reuse_across_many_frees() {
        let mut pool = Pool::<u64, RawSlot, Bare>::new();

        let slots: Vec<_> = (0..10).map(|_| pool.alloc()).collect();

        for &slot in &slots {
            pool.free(slot).unwrap();
        }

        // Reverse order of freeing.
        for &expected in slots.iter().rev() {
            assert_eq!(pool.alloc(), expected);
        }

        for &slot in &slots {
            pool.free(slot).unwrap();
        }
    }

    #[test]
    fn prewarm_is_tracked_but_not_allocated() {
        let pool = BarePool::<u32>::with_capacity(1000);

        assert_eq!(pool.tracked_count(), 1000);
        assert_eq!(pool.max_tracked_count(), 1000);
        assert_eq!(pool.free_count(), 1000);
        assert_eq!(pool.allocated_count(), 0);

        pool.integrity_check();
    }

    #[test]
    fn prewarmed_nodes_absorb_allocations() {
        let mut pool = BarePool::<u32>::with_capacity(10);

        let slots: Vec<_> = (0..10).map(|_| pool.alloc()).collect();
        assert_eq!(pool.tracked_count(), 10);

        let extra = pool.alloc();
        assert_eq!(pool.tracked_count(), 11);

        for slot in slots {
            pool.free(slot).unwrap();
        }
        pool.free(extra).unwrap();
    }

    #[test]
    fn counts_grow_only_on_creation() {
        let mut pool = GuardedPool::<u32>::new();

        let slots: Vec<_> = (0..300).map(|_| pool.alloc()).collect();
        assert_eq!(pool.tracked_count(), 300);
        assert_eq!(pool.max_allocated_count(), 300);

        for slot in slots {
            let before = pool.tracked_count();
            pool.free(slot).unwrap();
            assert_eq!(pool.tracked_count(), before);
        }

        assert_eq!(pool.allocated_count(), 0);
        assert_eq!(pool.free_count(), 300);
        assert_eq!(pool.max_allocated_count(), 300);

        pool.integrity_check();
    }

    #[test]
    fn alloc_free_pair_keeps_counts() {
        let mut pool = GuardedPool::<u32>::with_capacity(3);

        let held = pool.alloc();
        let before = pool.tracked_count();

        let slot = pool.alloc();
        pool.free(slot).unwrap();

        assert_eq!(pool.tracked_count(), before);
        pool.free(held).unwrap();
    }

    #[test]
    fn double_free_is_refused() {
        let mut pool = BarePool::<u32>::new();

        let slot = pool.alloc();
        pool.free(slot).unwrap();

        assert_eq!(
            pool.free(slot),
            Err(Error::InvalidArgument {
                index: slot.index()
            })
        );
        assert_eq!(pool.free_count(), 1);

        pool.integrity_check();
    }

    #[test]
    fn never_created_index_is_refused() {
        let mut pool = BarePool::<u32>::new();

        let result = pool.free(Slot::new(5, ()));

        assert_eq!(result, Err(Error::InvalidArgument { index: 5 }));
        assert_eq!(pool.tracked_count(), 0);
    }

    #[test]
    fn foreign_slot_is_refused() {
        let mut a = GuardedPool::<u32>::new();
        let mut b = GuardedPool::<u32>::with_capacity(2);

        let slot = a.alloc();

        assert_eq!(
            b.free(slot),
            Err(Error::ForeignPool {
                index: slot.index()
            })
        );
        assert_eq!(b.tracked_count(), 2);
        assert_eq!(b.free_count(), 2);
        b.integrity_check();

        a.free(slot).unwrap();
    }

    #[test]
    fn foreign_slot_with_allocated_index_is_refused() {
        let mut a = GuardedPool::<u32>::new();
        let mut b = GuardedPool::<u32>::new();

        let from_a = a.alloc();
        let from_b = b.alloc();
        assert_eq!(from_a.index(), from_b.index());

        assert!(matches!(b.free(from_a), Err(Error::ForeignPool { .. })));
        assert_eq!(b.allocated_count(), 1);
        assert!(b.is_allocated(from_b));
        assert!(!b.is_allocated(from_a));

        a.free(from_a).unwrap();
        b.free(from_b).unwrap();
    }

    #[test]
    fn overrun_is_detected() {
        let mut pool = Pool::<[u8; 4], RawSlot, Guarded>::new();

        let slot = pool.alloc();
        let ptr = pool.as_ptr(slot).cast::<u8>();

        // SAFETY: One byte past the payload is the first byte of the end sentinel, inside the
        // node allocation. Writing it is the misuse we want to detect.
        unsafe { ptr.add(size_of::<[u8; 4]>()).write(0xFF) };

        let free_before = pool.free_count();

        assert_eq!(
            pool.free(slot),
            Err(Error::CorruptionDetected {
                index: slot.index(),
                sentinel: Sentinel::End
            })
        );

        assert_eq!(pool.free_count(), free_before);
        assert!(pool.is_allocated(slot));
        pool.integrity_check();
    }

    #[test]
    fn underrun_is_detected() {
        let mut pool = Pool::<u64, RawSlot, Guarded>::new();

        let slot = pool.alloc();
        let ptr = pool.as_ptr(slot).cast::<u8>();

        // SAFETY: One byte before the payload is the last byte of the front sentinel, inside the
        // node allocation.
        unsafe { ptr.sub(1).write(0) };

        assert_eq!(
            pool.free(slot),
            Err(Error::CorruptionDetected {
                index: slot.index(),
                sentinel: Sentinel::Front
            })
        );
        assert_eq!(pool.allocated_count(), 1);
    }

    #[test]
    fn underrun_of_over_aligned_payload_is_detected() {
        #[repr(align(16))]
        struct Wide {
            _bytes: [u8; 16],
        }

        let mut pool = Pool::<Wide, RawSlot, Guarded>::new();

        let slot = pool.alloc();
        let ptr = pool.as_ptr(slot).cast::<u8>();

        // SAFETY: One byte before the payload is alignment padding after the front sentinel,
        // inside the node allocation.
        unsafe { ptr.sub(1).write(0) };

        let free_before = pool.free_count();

        assert_eq!(
            pool.free(slot),
            Err(Error::CorruptionDetected {
                index: slot.index(),
                sentinel: Sentinel::Front
            })
        );

        assert_eq!(pool.free_count(), free_before);
        assert!(pool.is_allocated(slot));
        pool.integrity_check();
    }

    #[test]
    fn wiped_guards_past_payload_are_detected() {
        let mut pool = Pool::<[u8; 3], RawSlot, Guarded>::new();

        let slot = pool.alloc();
        let ptr = pool.as_ptr(slot).cast::<u8>();

        // SAFETY: The payload, end sentinel and owner tag all lie within the first 24 bytes from
        // the payload start, inside the node allocation.
        unsafe { ptr.write_bytes(0, 24) };

        assert_eq!(
            pool.free(slot),
            Err(Error::CorruptionDetected {
                index: slot.index(),
                sentinel: Sentinel::End
            })
        );
        assert!(pool.is_allocated(slot));
    }

    #[test]
    fn auto_construct_pairs_construction_with_destruction() {
        static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);
        static DESTRUCTED: AtomicUsize = AtomicUsize::new(0);

        struct Counted;

        impl Default for Counted {
            fn default() -> Self {
                CONSTRUCTED.fetch_add(1, Ordering::Relaxed);
                Self
            }
        }

        impl Drop for Counted {
            fn drop(&mut self) {
                DESTRUCTED.fetch_add(1, Ordering::Relaxed);
            }
        }

        let mut pool = Pool::<Counted, AutoConstruct, Bare>::with_capacity(5);

        // Prewarming does not construct anything.
        assert_eq!(CONSTRUCTED.load(Ordering::Relaxed), 0);

        for _ in 0..3 {
            let slot = pool.alloc();
            pool.free(slot).unwrap();
        }

        assert_eq!(CONSTRUCTED.load(Ordering::Relaxed), 3);
        assert_eq!(DESTRUCTED.load(Ordering::Relaxed), 3);

        drop(pool);

        // Free nodes hold nothing, so teardown drops nothing.
        assert_eq!(DESTRUCTED.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn raw_slot_never_drops() {
        struct Flagged(Rc<Cell<bool>>);

        impl Drop for Flagged {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let dropped = Rc::new(Cell::new(false));
        let mut pool = Pool::<Flagged, RawSlot, Bare>::new();

        let slot = pool.alloc();
        pool.uninit_mut(slot).write(Flagged(Rc::clone(&dropped)));

        // SAFETY: We initialized the payload above and free() will not drop it.
        let value = unsafe { pool.as_ptr(slot).read() };

        pool.free(slot).unwrap();
        assert!(!dropped.get());

        drop(value);
        assert!(dropped.get());
    }

    #[test]
    fn panicking_constructor_leaves_node_on_free_list() {
        thread_local! {
            static FAIL: Cell<bool> = const { Cell::new(false) };
        }

        struct Fragile;

        impl Default for Fragile {
            fn default() -> Self {
                assert!(!FAIL.get(), "constructor failure requested");
                Self
            }
        }

        let mut pool = Pool::<Fragile, AutoConstruct, Guarded>::new();

        FAIL.set(true);
        let result = catch_unwind(AssertUnwindSafe(|| pool.alloc()));
        assert!(result.is_err());
        FAIL.set(false);

        assert_eq!(pool.tracked_count(), 1);
        assert_eq!(pool.free_count(), 1);
        pool.integrity_check();

        let slot = pool.alloc();
        pool.free(slot).unwrap();
    }

    #[test]
    fn payload_addresses_survive_growth() {
        let mut pool = BarePool::<u64>::new();

        let first = pool.alloc();
        let first_ptr = pool.as_ptr(first);

        let others: Vec<_> = (0..1000).map(|_| pool.alloc()).collect();

        assert_eq!(pool.as_ptr(first), first_ptr);

        pool.free(first).unwrap();
        for slot in others {
            pool.free(slot).unwrap();
        }
    }

    #[test]
    fn zero_sized_items() {
        let mut pool = BarePool::<()>::new();

        let a = pool.alloc();
        let b = pool.alloc();
        assert_ne!(a, b);

        pool.free(a).unwrap();
        pool.free(b).unwrap();
    }

    #[test]
    #[should_panic]
    fn get_after_free_panics() {
        let mut pool = BarePool::<u32>::new();

        let slot = pool.alloc();
        pool.free(slot).unwrap();

        _ = pool.get(slot);
    }

    #[test]
    #[should_panic]
    fn get_foreign_panics() {
        let mut a = GuardedPool::<u32>::new();
        let b = GuardedPool::<u32>::new();

        let slot = a.alloc();
        _ = b.get(slot);
    }

    #[test]
    #[should_panic]
    fn drop_with_outstanding_under_strict_policy_panics() {
        let mut pool = BarePool::<u32>::builder()
            .teardown_policy(TeardownPolicy::RequireAllFreed)
            .build();

        _ = pool.alloc();
    }

    #[test]
    fn drop_idle_under_strict_policy_is_fine() {
        let mut pool = BarePool::<u32>::builder()
            .teardown_policy(TeardownPolicy::RequireAllFreed)
            .initial_capacity(4)
            .build();

        let slot = pool.alloc();
        pool.free(slot).unwrap();
    }

    #[test]
    fn drop_with_outstanding_abandons_payloads() {
        let dropped = Rc::new(Cell::new(false));

        struct Flagged(Option<Rc<Cell<bool>>>);

        impl Default for Flagged {
            fn default() -> Self {
                Self(None)
            }
        }

        impl Drop for Flagged {
            fn drop(&mut self) {
                if let Some(flag) = &self.0 {
                    flag.set(true);
                }
            }
        }

        let mut pool = Pool::<Flagged, AutoConstruct, Bare>::new();
        let slot = pool.alloc();
        pool.get_mut(slot).0 = Some(Rc::clone(&dropped));

        drop(pool);

        assert!(!dropped.get());
    }

    #[test]
    fn coordinates_round_trip() {
        let coordinates = NodeCoordinates::<128>::from_index(300);
        assert_eq!(coordinates.slab_index, 2);
        assert_eq!(coordinates.index_in_slab, 44);
        assert_eq!(coordinates.to_index(), 300);
    }

    #[test]
    fn debug_output_names_item_type() {
        let pool = BarePool::<u16>::new();

        let text = format!("{pool:?}");
        assert!(text.contains("u16"), "unexpected debug output: {text}");
    }
}
