use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

/// An atomic boolean with one-way transition helpers.
#[repr(transparent)]
pub struct AtomicFlag {
    inner: AtomicBool,
}

impl AtomicFlag {
    /// Creates a new flag.
    #[inline(always)]
    pub const fn new(value: bool) -> Self {
        Self {
            inner: AtomicBool::new(value),
        }
    }

    /// Loads the current value.
    #[inline(always)]
    pub fn value(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }

    /// Stores a new value.
    #[inline(always)]
    pub fn set(&self, value: bool) {
        self.inner.store(value, Ordering::Release);
    }

    /// Returns `true` if the flag is set.
    #[inline(always)]
    pub fn is_true(&self) -> bool {
        self.value()
    }

    /// Returns `true` if the flag is clear.
    #[inline(always)]
    pub fn is_false(&self) -> bool {
        !self.value()
    }

    /// Swaps the value, returning the previous one.
    #[inline(always)]
    pub fn get_and_set(&self, value: bool) -> bool {
        self.inner.swap(value, Ordering::AcqRel)
    }

    /// Sets the flag if it is currently clear.
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// flag was already set.
    #[inline]
    pub fn make_true(&self) -> bool {
        self.inner
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Clears the flag if it is currently set.
    ///
    /// Returns `true` if this call performed the transition.
    #[inline]
    pub fn make_false(&self) -> bool {
        self.inner
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for AtomicFlag {
    fn default() -> Self {
        Self::new(false)
    }
}

impl From<bool> for AtomicFlag {
    fn from(value: bool) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for AtomicFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicFlag").field(&self.value()).finish()
    }
}
