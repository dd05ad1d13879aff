//! # `synchro` - Atomic Cells, Fences and Monitors
//!
//! Low-level concurrency primitives meant to sit underneath a larger
//! concurrency toolkit: lock-free atomic cells, explicit memory fences, and a
//! monitor object combining a reentrant lock with wait/notify signalling.
//!
//! ## Key Features
//!
//! - **Lock-free cells**: [`AtomicCell`], [`AtomicCounter`] and [`AtomicFlag`]
//!   never block; `update` retries with exponential backoff.
//! - **Explicit fences**: [`fence::full_memory_barrier`], [`Volatile`] and
//!   [`VolatileFields`] for publication patterns that are not built on a lock.
//! - **Monitors**: [`MonitorObject`] gives every instance one reentrant lock and
//!   one wait set. Waiting and signalling require a [`MonitorGuard`], so calling
//!   them without the lock does not compile.
//! - **Cooperative interruption**: [`interrupt`] cancels blocked waits with
//!   [`Error::Cancelled`].
//!
//! ## Architecture
//!
//! ```text
//! atomic ──┐
//! fence  ──┼── independent capabilities, combined by composition
//! sync   ──┘   (MonitorObject implements fence::Fenced)
//!   ├─ raw_monitor   three-state futex lock + owner/depth
//!   ├─ wait_queue    intrusive FIFO of parked waiters
//!   └─ interrupt     per-thread flag + unpark
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::thread;
//! use synchro::{AtomicCounter, MonitorObject};
//!
//! let ready = MonitorObject::new(AtomicBool::new(false));
//! let hits = AtomicCounter::new(0);
//!
//! thread::scope(|s| {
//!     s.spawn(|| {
//!         hits.increment();
//!         ready.synchronized(|guard| {
//!             guard.store(true, Ordering::Relaxed);
//!             guard.broadcast();
//!         });
//!     });
//!
//!     let ok = ready
//!         .wait_until(None, |flag| flag.load(Ordering::Relaxed))
//!         .unwrap();
//!     assert!(ok);
//! });
//! assert_eq!(hits.value(), 1);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod macros;

pub mod atomic;
pub mod config;
pub mod error;
pub mod fence;
pub mod sync;

pub use atomic::{AtomicCell, AtomicCounter, AtomicFlag};
pub use config::MonitorConfig;
pub use error::{Error, Result};
pub use fence::{Fenced, Volatile, VolatileFields};
pub use sync::interrupt;
pub use sync::{InterruptHandle, Monitor, MonitorGuard, MonitorObject, WaitOutcome};

// Compile-time assertions for memory layout
const _: () = {
    use core::mem;

    // `AtomicFlag` is `repr(transparent)` over `AtomicBool`.
    assert!(mem::size_of::<AtomicFlag>() == mem::size_of::<core::sync::atomic::AtomicBool>());

    // The counter is padded out to (at least) a cache line.
    assert!(mem::align_of::<AtomicCounter>() >= 32);
    assert!(mem::size_of::<AtomicCounter>() == mem::align_of::<AtomicCounter>());

    // Guards borrow the monitor and carry nothing else.
    assert!(mem::size_of::<MonitorGuard<'static, ()>>() == mem::size_of::<usize>());
};
