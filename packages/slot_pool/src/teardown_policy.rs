/// Determines what happens when a pool is dropped while callers still hold allocated slots.
///
/// Dropping a pool with outstanding slots is a caller error: the slots can no longer be freed and
/// any out-of-band pointers to their payloads become dangling. The pool never runs the payload
/// destructors of such slots, it only releases the memory.
///
/// # Examples
///
/// ```
/// use slot_pool::{Pool, TeardownPolicy};
///
/// // The teardown policy is set at pool creation time.
/// let pool = Pool::<u32>::builder()
///     .teardown_policy(TeardownPolicy::RequireAllFreed)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum TeardownPolicy {
    /// The pool logs a warning and abandons the payloads of outstanding slots. This is the
    /// default.
    #[default]
    AbandonOutstanding,

    /// The pool panics if any slot is still allocated when it is dropped.
    ///
    /// This may be valuable when payloads own resources that must be cleaned up, or to catch
    /// leaks in tests.
    RequireAllFreed,
}
