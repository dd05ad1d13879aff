//! Lock-free atomic primitives.
//!
//! None of these types block. Ordering comes from the atomic operation itself
//! (acquire on reads, release on writes, acquire-release on read-modify-write),
//! never from the fences in [`crate::fence`].
//!
//! Retry loops (`update`) back off with [`crossbeam_utils::Backoff`] between
//! attempts. They are lock-free: a retry only happens because another writer
//! succeeded.

/// Reference slot with value and identity compare-and-set.
pub mod cell;
/// 64-bit signed counter.
pub mod counter;
/// Atomic boolean.
pub mod flag;

pub use cell::AtomicCell;
pub use counter::AtomicCounter;
pub use flag::AtomicFlag;
