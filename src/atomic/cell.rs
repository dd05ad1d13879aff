use core::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use crossbeam_utils::Backoff;

use crate::error::{Error, Result};

/// A lock-free, single-slot holder for a shared value.
///
/// The slot stores an `Arc<T>`; readers clone the handle (or the value) and
/// writers publish a fresh allocation with release semantics, so a reader that
/// observes a new value also observes everything the writer did before `set`.
///
/// Two compare-and-set flavours are provided:
/// - [`compare_and_set`](Self::compare_and_set) compares by value (`PartialEq`).
/// - [`compare_and_set_arc`](Self::compare_and_set_arc) compares by identity.
///
/// An empty slot is modelled with `Option`:
///
/// ```rust
/// use synchro::AtomicCell;
///
/// let cell: AtomicCell<Option<&str>> = AtomicCell::default();
/// assert_eq!(cell.get(), None);
/// assert!(cell.compare_and_set(&None, Some("a")));
/// assert_eq!(cell.get(), Some("a"));
/// ```
pub struct AtomicCell<T> {
    slot: ArcSwap<T>,
}

impl<T> AtomicCell<T> {
    /// Creates a cell holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            slot: ArcSwap::from_pointee(initial),
        }
    }

    /// Creates a cell that shares an existing allocation.
    pub fn from_arc(initial: Arc<T>) -> Self {
        Self {
            slot: ArcSwap::new(initial),
        }
    }

    /// Returns a handle to the current value.
    #[inline]
    pub fn load(&self) -> Arc<T> {
        self.slot.load_full()
    }

    /// Publishes `value`.
    #[inline]
    pub fn set(&self, value: T) {
        self.slot.store(Arc::new(value));
    }

    /// Publishes an existing allocation.
    #[inline]
    pub fn store_arc(&self, value: Arc<T>) {
        self.slot.store(value);
    }

    /// Exchanges the current allocation for `value`, returning the previous one.
    #[inline]
    pub fn swap_arc(&self, value: Arc<T>) -> Arc<T> {
        self.slot.swap(value)
    }

    /// Installs `new` iff the slot still holds the very allocation `expected`.
    ///
    /// Identity comparison: two distinct allocations with equal contents do
    /// not match.
    #[inline]
    pub fn compare_and_set_arc(&self, expected: &Arc<T>, new: Arc<T>) -> bool {
        let previous = self.slot.compare_and_swap(expected, new);
        Arc::ptr_eq(&previous, expected)
    }

    /// Consumes the cell, returning the current allocation.
    pub fn into_arc(self) -> Arc<T> {
        self.slot.into_inner()
    }
}

impl<T: Clone> AtomicCell<T> {
    /// Returns a clone of the current value.
    #[inline]
    pub fn get(&self) -> T {
        T::clone(&self.slot.load())
    }

    /// Atomically stores `new` and returns the previous value.
    #[inline]
    pub fn get_and_set(&self, new: T) -> T {
        Arc::unwrap_or_clone(self.slot.swap(Arc::new(new)))
    }

    /// Replaces the value with `f(current)`, retrying until no other writer
    /// intervenes. Returns the value that was installed.
    ///
    /// `f` may run several times under contention and must tolerate that.
    pub fn update<F>(&self, mut f: F) -> T
    where
        F: FnMut(&T) -> T,
    {
        let backoff = Backoff::new();
        loop {
            let current = self.slot.load_full();
            let next = Arc::new(f(&current));
            if self.compare_and_set_arc(&current, Arc::clone(&next)) {
                return T::clone(&next);
            }
            backoff.spin();
        }
    }

    /// Makes a single attempt to replace the value with `f(current)`.
    ///
    /// # Errors
    /// Returns [`Error::ConcurrentUpdate`] if another writer changed the slot
    /// between the read and the compare-and-set; the slot is left untouched.
    pub fn try_update<F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&T) -> T,
    {
        let current = self.slot.load_full();
        let next = Arc::new(f(&current));
        if self.compare_and_set_arc(&current, Arc::clone(&next)) {
            Ok(T::clone(&next))
        } else {
            Err(Error::ConcurrentUpdate)
        }
    }

    /// Consumes the cell, returning the current value.
    pub fn into_inner(self) -> T {
        Arc::unwrap_or_clone(self.into_arc())
    }
}

impl<T: PartialEq> AtomicCell<T> {
    /// Installs `new` iff the current value equals `expected`.
    ///
    /// Linearizes at the identity compare-and-set of the allocation that was
    /// found equal; if that allocation was replaced in the meantime the value
    /// is re-read and compared again.
    pub fn compare_and_set(&self, expected: &T, new: T) -> bool {
        let new = Arc::new(new);
        let backoff = Backoff::new();
        loop {
            let current = self.slot.load_full();
            if *current != *expected {
                return false;
            }
            if self.compare_and_set_arc(&current, Arc::clone(&new)) {
                return true;
            }
            backoff.spin();
        }
    }
}

impl<T: Default> Default for AtomicCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for AtomicCell<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for AtomicCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicCell").field(&*self.slot.load()).finish()
    }
}
