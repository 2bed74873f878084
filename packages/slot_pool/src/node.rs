use std::mem::{MaybeUninit, offset_of};
use std::ops::Range;
use std::ptr::{self, NonNull};

use crate::GuardMode;

/// One slot of a pool: the payload storage for a single `T`, the guard data demanded by the
/// guard mode `G` and the free list link.
///
/// The layout is `#[repr(C)]` so that the guard data flanks the payload. The end sentinel has an
/// alignment of 1 and therefore starts at the first byte past the payload. If `T` is aligned to
/// more than the front sentinel, the padding between the two is stamped with
/// [`GuardMode::FRONT_PADDING`] and checked along with the front sentinel, so the byte right
/// before the payload is always guarded. With [`Bare`][crate::Bare] all guard fields are
/// zero-sized and there is no padding.
///
/// Nodes are only ever accessed through raw pointers into slab memory. We never create a
/// reference to a whole node, which keeps out-of-band writes through payload pointers valid.
#[repr(C)]
pub(crate) struct Node<T, G: GuardMode> {
    front: G::Front,
    payload: MaybeUninit<T>,
    end: G::End,
    tag: G::Tag,
    state: NodeState,
}

/// Whether a node is on the free list or handed out to a caller. There are no other states.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum NodeState {
    /// On the free list; `next` is the arena index of the next free node, if any. The payload is
    /// never-constructed or already destructed.
    Free { next: Option<usize> },

    /// Handed out by `alloc()` and not yet freed.
    Allocated,
}

/// The guard data of a node, copied out for verification.
#[derive(Debug)]
pub(crate) struct NodeGuards<G: GuardMode> {
    pub(crate) front: G::Front,

    /// Whether every padding byte between the front sentinel and the payload still holds
    /// [`GuardMode::FRONT_PADDING`].
    pub(crate) front_padding_intact: bool,

    pub(crate) end: G::End,
    pub(crate) tag: G::Tag,
}

impl<T, G: GuardMode> Node<T, G> {
    /// Stamps a fresh node into uninitialized memory. The node starts out free, linked to nothing.
    ///
    /// # Safety
    ///
    /// `node` must be valid for writes and correctly aligned for `Node<T, G>`.
    pub(crate) unsafe fn init(node: NonNull<Self>, owner: G::Owner) {
        // SAFETY: Forwarding guarantees from the caller.
        unsafe {
            node.as_ptr().write(Self {
                front: G::FRONT,
                payload: MaybeUninit::uninit(),
                end: G::END,
                tag: G::tag(owner),
                state: NodeState::Free { next: None },
            });
        }

        for offset in Self::front_padding() {
            // SAFETY: The offset lies inside the node, between the front sentinel and the payload.
            let byte = unsafe { node.cast::<u8>().add(offset) };

            // SAFETY: Padding bytes are never written through the typed fields after `init()`.
            unsafe { byte.write(G::FRONT_PADDING) };
        }
    }

    /// Byte offsets of the alignment padding between the front sentinel and the payload.
    fn front_padding() -> Range<usize> {
        size_of::<G::Front>()..offset_of!(Self, payload)
    }

    /// # Safety
    ///
    /// `node` must point to a node initialized via `init()`.
    pub(crate) unsafe fn payload(node: NonNull<Self>) -> NonNull<MaybeUninit<T>> {
        // SAFETY: Forwarding guarantees from the caller. The projection does not create a
        // reference, so the resulting pointer keeps the provenance of the whole slab.
        let payload = unsafe { ptr::addr_of_mut!((*node.as_ptr()).payload) };

        // SAFETY: Derived from a non-null pointer by field projection.
        unsafe { NonNull::new_unchecked(payload) }
    }

    /// # Safety
    ///
    /// `node` must point to a node initialized via `init()`.
    pub(crate) unsafe fn state(node: NonNull<Self>) -> NodeState {
        // SAFETY: Forwarding guarantees from the caller.
        unsafe { ptr::addr_of!((*node.as_ptr()).state).read() }
    }

    /// # Safety
    ///
    /// `node` must point to a node initialized via `init()` and no reference to the node's
    /// state may exist.
    pub(crate) unsafe fn set_state(node: NonNull<Self>, state: NodeState) {
        // SAFETY: Forwarding guarantees from the caller.
        unsafe { ptr::addr_of_mut!((*node.as_ptr()).state).write(state) }
    }

    /// Reads the guard data. Callers may have scribbled over it through out-of-band access to the
    /// payload, which is exactly what we want to find out. The guard fields are plain integers and
    /// byte arrays, so whatever was written there is still a valid value.
    ///
    /// # Safety
    ///
    /// `node` must point to a node initialized via `init()`.
    pub(crate) unsafe fn guards(node: NonNull<Self>) -> NodeGuards<G> {
        let front_padding_intact = Self::front_padding().all(|offset| {
            // SAFETY: The offset lies inside the node, between the front sentinel and the payload.
            let byte = unsafe { node.cast::<u8>().add(offset) };

            // SAFETY: Stamped by `init()`; any value is a valid `u8`.
            (unsafe { byte.read() }) == G::FRONT_PADDING
        });

        // SAFETY: Forwarding guarantees from the caller.
        unsafe {
            NodeGuards {
                front: ptr::addr_of!((*node.as_ptr()).front).read(),
                front_padding_intact,
                end: ptr::addr_of!((*node.as_ptr()).end).read(),
                tag: ptr::addr_of!((*node.as_ptr()).tag).read(),
            }
        }
    }
}
