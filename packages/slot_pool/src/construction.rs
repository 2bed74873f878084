use std::mem::MaybeUninit;

/// Decides at compile time whether a pool constructs and destructs the objects in its slots.
///
/// There are exactly two implementations:
///
/// * [`AutoConstruct`] - [`alloc()`][1] writes `T::default()` into the slot and a successful
///   [`free()`][2] drops it in place. Every construction is paired with exactly one destruction.
/// * [`RawSlot`] - the pool never touches the payload. [`alloc()`][1] hands out uninitialized
///   storage and [`free()`][2] recycles it without running any destructor. Initializing the
///   payload and cleaning it up before freeing the slot is the caller's responsibility.
///
/// Nodes waiting on the free list never hold a live object under either policy.
///
/// This trait is sealed and cannot be implemented outside this crate.
///
/// [1]: crate::Pool::alloc
/// [2]: crate::Pool::free
pub trait ConstructionPolicy<T>: private::Sealed + Send + Sync + 'static {
    /// Whether an allocated payload is guaranteed to hold an initialized `T`.
    const CONSTRUCTS: bool;

    #[doc(hidden)]
    fn construct(payload: &mut MaybeUninit<T>);

    /// # Safety
    ///
    /// The payload must have been initialized by `construct()` and not destructed since.
    #[doc(hidden)]
    unsafe fn destruct(payload: &mut MaybeUninit<T>);
}

/// Construction policy that runs `T::default()` on allocation and drops the object on free.
/// See [`ConstructionPolicy`].
///
/// # Example
///
/// ```rust
/// use slot_pool::Pool;
///
/// let mut pool = Pool::<String>::new();
///
/// let slot = pool.alloc();
/// assert_eq!(pool.get(slot), "");
///
/// pool.get_mut(slot).push_str("hello");
/// assert_eq!(pool.get(slot), "hello");
///
/// // The string is dropped here, before the slot goes back on the free list.
/// pool.free(slot).unwrap();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AutoConstruct;

/// Construction policy that hands out uninitialized storage. See [`ConstructionPolicy`].
///
/// # Example
///
/// ```rust
/// use slot_pool::{Pool, RawSlot};
///
/// let mut pool = Pool::<u64, RawSlot>::new();
///
/// let slot = pool.alloc();
/// pool.uninit_mut(slot).write(42);
///
/// // SAFETY: We initialized the payload above.
/// assert_eq!(unsafe { *pool.as_ptr(slot).as_ptr() }, 42);
///
/// pool.free(slot).unwrap();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RawSlot;

impl<T: Default> ConstructionPolicy<T> for AutoConstruct {
    const CONSTRUCTS: bool = true;

    #[inline]
    fn construct(payload: &mut MaybeUninit<T>) {
        payload.write(T::default());
    }

    #[inline]
    unsafe fn destruct(payload: &mut MaybeUninit<T>) {
        // SAFETY: Forwarding the guarantee from our caller that the payload is initialized.
        unsafe {
            payload.assume_init_drop();
        }
    }
}

impl<T> ConstructionPolicy<T> for RawSlot {
    const CONSTRUCTS: bool = false;

    #[inline]
    fn construct(_payload: &mut MaybeUninit<T>) {}

    #[inline]
    unsafe fn destruct(_payload: &mut MaybeUninit<T>) {}
}

mod private {
    pub trait Sealed {}

    impl Sealed for super::AutoConstruct {}
    impl Sealed for super::RawSlot {}
}
