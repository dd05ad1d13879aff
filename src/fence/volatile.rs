//! `Volatile<T>`: a typed field with ordered reads and writes.

use core::fmt;

use crossbeam_utils::atomic::AtomicCell;
use crossbeam_utils::Backoff;

use super::{load_fence, store_fence};

/// A field whose reads always observe the latest published write.
///
/// Lock-free when `T` fits a native atomic; larger `Copy` types fall back to
/// `crossbeam-utils`' striped sequence locks, which keep the same ordering.
pub struct Volatile<T> {
    cell: AtomicCell<T>,
}

impl<T> Volatile<T> {
    /// Creates a field holding `value`.
    pub const fn new(value: T) -> Self {
        Self {
            cell: AtomicCell::new(value),
        }
    }

    /// Returns `true` if accesses compile to native atomics.
    pub const fn is_lock_free() -> bool {
        AtomicCell::<T>::is_lock_free()
    }

    /// Consumes the field.
    pub fn into_inner(self) -> T {
        self.cell.into_inner()
    }
}

impl<T: Copy> Volatile<T> {
    /// Load fence, then an ordered read.
    #[inline]
    pub fn get_volatile(&self) -> T {
        load_fence();
        self.cell.load()
    }

    /// Ordered write, then a store fence.
    #[inline]
    pub fn set_volatile(&self, value: T) {
        self.cell.store(value);
        store_fence();
    }

    /// Stores `value`, returning the previous value.
    #[inline]
    pub fn swap(&self, value: T) -> T {
        self.cell.swap(value)
    }
}

impl<T: Copy + Eq> Volatile<T> {
    /// Stores `new` iff the field currently holds `current`.
    #[inline]
    pub fn compare_and_set(&self, current: T, new: T) -> bool {
        self.cell.compare_exchange(current, new).is_ok()
    }

    /// Replaces the value with `f(current)` until no other writer intervenes;
    /// returns the installed value.
    pub fn update<F>(&self, mut f: F) -> T
    where
        F: FnMut(T) -> T,
    {
        let backoff = Backoff::new();
        let mut current = self.cell.load();
        loop {
            let next = f(current);
            match self.cell.compare_exchange(current, next) {
                Ok(_) => return next,
                Err(actual) => {
                    current = actual;
                    backoff.spin();
                }
            }
        }
    }
}

impl<T: Default> Default for Volatile<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for Volatile<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Volatile").field(&self.cell.load()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn older_writes_are_visible_through_a_volatile_write() {
        // A writer bumps `plain` before `published`; a reader that sees
        // `published == i` must see `plain >= i`.
        let plain = Volatile::new(0u64);
        let published = Volatile::new(0u64);

        thread::scope(|s| {
            s.spawn(|| {
                for i in 1..=10_000 {
                    plain.swap(i);
                    published.set_volatile(i);
                }
            });
            s.spawn(|| {
                for _ in 0..1_000 {
                    let seen = published.get_volatile();
                    assert!(plain.get_volatile() >= seen);
                }
            });
        });
    }

    #[test]
    fn compare_and_set_and_update() {
        let field = Volatile::new(1u32);
        assert!(!field.compare_and_set(2, 3));
        assert!(field.compare_and_set(1, 3));
        assert_eq!(field.update(|v| v * 2), 6);
        assert_eq!(field.get_volatile(), 6);
        assert!(Volatile::<u32>::is_lock_free());
    }
}
