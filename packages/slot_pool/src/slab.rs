use std::alloc::{Layout, alloc, dealloc, handle_alloc_error};
use std::any::type_name;
use std::fmt;
use std::ptr::NonNull;

use crate::{GuardMode, Node};

/// A fixed-capacity block of node storage. This is the backing memory of a `Pool`.
///
/// The memory for all `CAPACITY` nodes is obtained up front but nodes are created one at a time,
/// on demand, in index order. Only created nodes may be accessed. The block never moves and is
/// only released when the slab is dropped, so pointers to created nodes remain valid for the
/// lifetime of the slab.
///
/// The slab knows nothing about the free list or about which nodes are handed out; that is all
/// tracked by the pool through the node state.
pub(crate) struct NodeSlab<T, G: GuardMode, const CAPACITY: usize> {
    first_node_ptr: NonNull<Node<T, G>>,

    /// How many nodes at the start of the block have been initialized.
    created: usize,
}

impl<T, G: GuardMode, const CAPACITY: usize> NodeSlab<T, G, CAPACITY> {
    /// Reserves memory for `CAPACITY` nodes.
    ///
    /// Failing to obtain the memory is fatal and reported via [`handle_alloc_error()`].
    ///
    /// # Panics
    ///
    /// Panics if `CAPACITY` is zero.
    #[must_use]
    pub(crate) fn new() -> Self {
        assert!(CAPACITY > 0, "NodeSlab must have non-zero capacity");

        let layout = Self::layout();

        // SAFETY: The layout is valid for the node array and not zero-sized because nodes always
        // carry their state, even if `T` and the guard data are zero-sized.
        let ptr = unsafe { alloc(layout) }.cast::<Node<T, G>>();

        let Some(first_node_ptr) = NonNull::new(ptr) else {
            handle_alloc_error(layout)
        };

        Self {
            first_node_ptr,
            created: 0,
        }
    }

    #[must_use]
    fn layout() -> Layout {
        Layout::array::<Node<T, G>>(CAPACITY).expect("simple flat array layout must be calculable")
    }

    /// Number of nodes created in this slab.
    #[must_use]
    pub(crate) fn created(&self) -> usize {
        self.created
    }

    #[must_use]
    pub(crate) fn is_full(&self) -> bool {
        self.created >= CAPACITY
    }

    /// Creates the next node, stamped with `owner`, and returns its index within the slab.
    ///
    /// # Panics
    ///
    /// Panics if the slab is full.
    pub(crate) fn create_node(&mut self, owner: G::Owner) -> usize {
        assert!(
            !self.is_full(),
            "cannot create a node in a full slab of {}",
            type_name::<T>()
        );

        let index = self.created;

        // SAFETY: Guarded by the capacity assertion above, the pointer is within the block.
        let node = unsafe { self.first_node_ptr.add(index) };

        // SAFETY: The block is valid for writes and `Layout::array` gives us correct alignment.
        unsafe { Node::init(node, owner) };

        self.created = index
            .checked_add(1)
            .expect("guarded by capacity assertion above");

        index
    }

    /// Pointer to a created node.
    ///
    /// # Panics
    ///
    /// Panics if the node at `index` has not been created.
    #[must_use]
    pub(crate) fn node_ptr(&self, index: usize) -> NonNull<Node<T, G>> {
        assert!(
            index < self.created,
            "node {index} has not been created in slab of {}",
            type_name::<T>()
        );

        // SAFETY: Guarded by bounds check above, so we are guaranteed that the pointer is valid.
        unsafe { self.first_node_ptr.add(index) }
    }
}

impl<T, G: GuardMode, const CAPACITY: usize> Drop for NodeSlab<T, G, CAPACITY> {
    fn drop(&mut self) {
        // Payloads are not dropped here. Free nodes hold no live object and objects in allocated
        // nodes are abandoned by the pool according to its teardown policy.

        // SAFETY: The layout must match between alloc and dealloc. It does.
        unsafe {
            dealloc(self.first_node_ptr.as_ptr().cast(), Self::layout());
        }
    }
}

impl<T, G: GuardMode, const CAPACITY: usize> fmt::Debug for NodeSlab<T, G, CAPACITY> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSlab")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("capacity", &CAPACITY)
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}

// SAFETY: Yes, there are raw pointers involved here but nothing inherently non-thread-mobile
// about it, so as long as T itself can move between threads, the slab can do so, too.
unsafe impl<T: Send, G: GuardMode, const CAPACITY: usize> Send for NodeSlab<T, G, CAPACITY> {}
