use core::fmt;
use core::sync::atomic::{AtomicI64, Ordering};

use crossbeam_utils::{Backoff, CachePadded};
use num_traits::ToPrimitive;

use crate::error::{Error, Result};

/// A 64-bit signed atomic counter.
///
/// Overflow policy: `increment*` / `decrement*` **saturate** at `i64::MIN` and
/// `i64::MAX`; the `checked_*` variants report [`Error::Overflow`] and leave the
/// value untouched. Nothing wraps silently.
///
/// The counter sits on its own cache line so that hot counters placed next to
/// each other do not false-share.
///
/// ```rust
/// use synchro::AtomicCounter;
///
/// let counter = AtomicCounter::new(5);
/// assert_eq!(counter.increment_by(3), 8);
/// assert_eq!(counter.decrement_by(2), 6);
/// ```
pub struct AtomicCounter {
    value: CachePadded<AtomicI64>,
}

impl AtomicCounter {
    /// Creates a counter starting at `initial`.
    #[inline]
    pub const fn new(initial: i64) -> Self {
        Self {
            value: CachePadded::new(AtomicI64::new(initial)),
        }
    }

    /// Creates a counter from any primitive numeric value.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if `initial` is not an integer in the
    /// 64-bit signed range.
    pub fn try_new<V: ToPrimitive>(initial: V) -> Result<Self> {
        Ok(Self::new(integer_arg(&initial)?))
    }

    /// Returns the current value.
    #[inline]
    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    /// Stores `value`.
    #[inline]
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Release);
    }

    /// Stores any primitive numeric value.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if `value` is not a 64-bit integer; the
    /// counter is not touched in that case.
    pub fn try_set<V: ToPrimitive>(&self, value: V) -> Result<()> {
        self.set(integer_arg(&value)?);
        Ok(())
    }

    /// Stores `value`, returning the previous value.
    #[inline]
    pub fn get_and_set(&self, value: i64) -> i64 {
        self.value.swap(value, Ordering::AcqRel)
    }

    /// Adds one; returns the resulting value.
    #[inline]
    pub fn increment(&self) -> i64 {
        self.increment_by(1)
    }

    /// Subtracts one; returns the resulting value.
    #[inline]
    pub fn decrement(&self) -> i64 {
        self.decrement_by(1)
    }

    /// Adds `delta`, saturating at the 64-bit bounds; returns the result.
    pub fn increment_by(&self, delta: i64) -> i64 {
        self.apply(|v| Some(v.saturating_add(delta)))
            .unwrap_or_else(|current| current)
    }

    /// Subtracts `delta`, saturating at the 64-bit bounds; returns the result.
    pub fn decrement_by(&self, delta: i64) -> i64 {
        self.apply(|v| Some(v.saturating_sub(delta)))
            .unwrap_or_else(|current| current)
    }

    /// Adds `delta` unless that would overflow.
    ///
    /// # Errors
    /// [`Error::Overflow`]; the counter keeps its value.
    pub fn checked_increment_by(&self, delta: i64) -> Result<i64> {
        self.apply(|v| v.checked_add(delta))
            .map_err(|_| Error::Overflow)
    }

    /// Subtracts `delta` unless that would overflow.
    ///
    /// # Errors
    /// [`Error::Overflow`]; the counter keeps its value.
    pub fn checked_decrement_by(&self, delta: i64) -> Result<i64> {
        self.apply(|v| v.checked_sub(delta))
            .map_err(|_| Error::Overflow)
    }

    /// Stores `new` iff the current value is `expected`.
    #[inline]
    pub fn compare_and_set(&self, expected: i64, new: i64) -> bool {
        self.value
            .compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// [`compare_and_set`](Self::compare_and_set) over arbitrary numeric inputs.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if either argument is not a 64-bit integer.
    /// Both are validated before the compare-and-set is attempted.
    pub fn try_compare_and_set<E, N>(&self, expected: E, new: N) -> Result<bool>
    where
        E: ToPrimitive,
        N: ToPrimitive,
    {
        let expected = integer_arg(&expected)?;
        let new = integer_arg(&new)?;
        Ok(self.compare_and_set(expected, new))
    }

    /// Replaces the value with `f(current)`, retrying on interference, and
    /// returns the value that was installed.
    ///
    /// `f` may run more than once; keep it free of unrepeatable side effects.
    pub fn update<F>(&self, mut f: F) -> i64
    where
        F: FnMut(i64) -> i64,
    {
        let backoff = Backoff::new();
        let mut current = self.value.load(Ordering::Acquire);
        loop {
            let next = f(current);
            match self.value.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => {
                    current = actual;
                    backoff.spin();
                }
            }
        }
    }

    /// CAS loop shared by the arithmetic operations. `Ok(new)` when `f`
    /// produced a value and it was installed, `Err(current)` when `f` declined.
    #[inline]
    fn apply<F>(&self, mut f: F) -> Result<i64, i64>
    where
        F: FnMut(i64) -> Option<i64>,
    {
        let mut installed = 0;
        self.value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                let next = f(v)?;
                installed = next;
                Some(next)
            })
            .map(|_| installed)
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new(0)
    }
}

impl From<i64> for AtomicCounter {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for AtomicCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicCounter").field(&self.value()).finish()
    }
}

/// Converts a numeric primitive into the counter domain.
///
/// Integral floating-point values (`3.0`) are accepted; fractional, NaN,
/// infinite and out-of-range values are not.
pub(crate) fn integer_arg<V: ToPrimitive>(value: &V) -> Result<i64> {
    let invalid = || Error::invalid_argument("value must be an integer in the 64-bit signed range");
    let int = value.to_i64().ok_or_else(invalid)?;
    // `to_i64` truncates floats; a lossless integer survives the round trip.
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    let exact = value.to_f64().map_or(true, |f| f == int as f64);
    if exact {
        Ok(int)
    } else {
        Err(invalid())
    }
}
