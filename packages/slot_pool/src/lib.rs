//! A fixed-type object pool that recycles slots through a LIFO free list.
//!
//! This crate provides [`Pool`], a pool for values of one type `T` that hands out [`Slot`]
//! handles in O(1) and takes them back in O(1). Returned slots are kept on a free list and the
//! most recently freed slot is the next one handed out, which keeps hot memory hot. Memory is
//! only ever released when the pool is dropped.
//!
//! # Key Features
//!
//! - **O(1) alloc and free**: no searching, no locking, no system allocator on the reuse path
//! - **Stable addresses**: payloads never move, so raw pointers obtained via
//!   [`Pool::as_ptr()`] remain valid while the slot is allocated
//! - **Construction policy**: [`AutoConstruct`] runs `T::default()` on alloc and drops on free,
//!   [`RawSlot`] hands out uninitialized storage, chosen at the type level
//! - **Guard layer**: [`Guarded`] nodes carry sentinels around each payload and an owner tag, so
//!   [`Pool::free()`] can refuse slots from other pools and detect buffer overruns.
//!   [`DefaultGuard`] enables this in debug builds only
//! - **Per-thread pools**: [`LocalPool`] is created explicitly by each worker thread and only
//!   materialized on first use
//! - **Diagnostics**: current and historical node counts for capacity tuning
//!
//! # Example
//!
//! ```rust
//! use slot_pool::{Error, Pool};
//!
//! let mut pool = Pool::<String>::with_capacity(16);
//!
//! let greeting = pool.alloc();
//! pool.get_mut(greeting).push_str("Hello");
//!
//! let name = pool.alloc();
//! pool.get_mut(name).push_str("World");
//!
//! assert_eq!(format!("{}, {}!", pool.get(greeting), pool.get(name)), "Hello, World!");
//!
//! pool.free(greeting).unwrap();
//! pool.free(name).unwrap();
//!
//! // Every slot can only be freed once.
//! assert!(matches!(pool.free(name), Err(Error::InvalidArgument { .. })));
//!
//! // All prewarmed nodes are still tracked, none of them are handed out.
//! assert_eq!(pool.tracked_count(), 16);
//! assert_eq!(pool.allocated_count(), 0);
//! ```
//!
//! # Raw slots
//!
//! ```rust
//! use slot_pool::{Pool, RawSlot};
//!
//! let mut pool = Pool::<[u8; 64], RawSlot>::new();
//!
//! let slot = pool.alloc();
//! let buffer = pool.as_ptr(slot);
//!
//! // SAFETY: The slot is allocated and nothing else references the payload.
//! unsafe { buffer.write([7; 64]) };
//!
//! pool.free(slot).unwrap();
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod builder;
mod construction;
mod error;
mod guard;
mod local_pool;
mod node;
mod pool;
mod slab;
mod slot;
mod teardown_policy;

pub use builder::*;
pub use construction::*;
pub use error::*;
pub use guard::{Bare, DefaultGuard, GuardMode, Guarded, PoolIdentity};
pub use local_pool::*;
pub(crate) use node::*;
pub use pool::*;
pub(crate) use slab::*;
pub use slot::*;
pub use teardown_policy::*;
