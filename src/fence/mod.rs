//! Explicit memory barriers and ordered field storage.
//!
//! Rust fences synchronize through atomic accesses: a release (or stronger)
//! fence before an atomic store pairs with an acquire (or stronger) fence after
//! an atomic load that reads that store. Every field type in this module is
//! built on atomics, so the fences here always have something to pair with.
//!
//! Native fence instructions are used unconditionally; there is no emulated
//! fallback through a sentinel location.

use core::sync::atomic::{fence, Ordering};

pub mod fields;
pub mod volatile;

pub use fields::VolatileFields;
pub use volatile::Volatile;

/// Full store+load barrier.
///
/// Writes made by the calling thread before the call become visible to any
/// thread that later executes `full_memory_barrier` after observing an atomic
/// write this thread made after the call.
#[inline]
pub fn full_memory_barrier() {
    fence(Ordering::SeqCst);
}

/// Acquire barrier: later reads are not reordered before earlier reads.
#[inline]
pub fn load_fence() {
    fence(Ordering::Acquire);
}

/// Release barrier: earlier writes are not reordered after later writes.
#[inline]
pub fn store_fence() {
    fence(Ordering::Release);
}

/// Capability for objects that publish state outside a lock.
///
/// All methods have default bodies; implementing the trait is the opt-in.
/// [`crate::MonitorObject`] and [`VolatileFields`] implement it, so it can be
/// combined with locking by composition rather than inheritance.
pub trait Fenced {
    /// Issues a full barrier on behalf of `self`.
    #[inline]
    fn full_memory_barrier(&self) {
        full_memory_barrier();
    }

    /// Makes a batch of preceding field writes visible as a unit.
    #[inline]
    fn ensure_visibility(&self) {
        store_fence();
    }
}
