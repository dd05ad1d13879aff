//! `MonitorObject`: a reentrant lock with a single implicit condition.

use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;
use core::ptr::NonNull;
use std::thread;
use std::time::{Duration, Instant};

use super::interrupt;
use super::raw_monitor::RawMonitor;
use super::wait_queue::{WaitNode, WaitQueue};
use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use crate::fence::Fenced;
use crate::macros::{debug_event, trace_event};

/// How a [`MonitorGuard::wait`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitOutcome {
    /// A `signal` or `broadcast` was consumed.
    Notified,
    /// The timeout elapsed first.
    TimedOut,
}

impl WaitOutcome {
    /// Returns `true` for [`WaitOutcome::TimedOut`].
    pub fn timed_out(self) -> bool {
        self == Self::TimedOut
    }
}

/// A value guarded by an intrinsic, reentrant monitor.
///
/// Each instance owns exactly one lock and one wait set. The lock is held for
/// the lifetime of a [`MonitorGuard`]; the guard is also the only way to wait
/// or signal, so "must hold the lock" is checked by the compiler.
///
/// Reentrancy means a nested `synchronized` on the same thread succeeds, and
/// therefore the guard only hands out `&T`. Use `Cell`, `RefCell` or atomics
/// inside `T` for mutation; the monitor makes them safe to share.
///
/// ```rust
/// use std::cell::Cell;
/// use synchro::MonitorObject;
///
/// let counter = MonitorObject::new(Cell::new(0));
/// counter.synchronized(|outer| {
///     outer.set(outer.get() + 1);
///     counter.synchronized(|inner| inner.set(inner.get() + 1));
/// });
/// assert_eq!(counter.into_inner().get(), 2);
/// ```
pub struct MonitorObject<T: ?Sized> {
    raw: RawMonitor,
    waiters: WaitQueue,
    value: T,
}

// SAFETY: the value is only reachable through a guard, and guards for one
// monitor exist on one thread at a time.
unsafe impl<T: ?Sized + Send> Sync for MonitorObject<T> {}

impl<T> MonitorObject<T> {
    /// Creates a monitor around `value` with the default configuration.
    pub const fn new(value: T) -> Self {
        Self::with_config(value, MonitorConfig::new())
    }

    /// Creates a monitor around `value`.
    pub const fn with_config(value: T, config: MonitorConfig) -> Self {
        Self {
            raw: RawMonitor::new(config.spin_limit),
            waiters: WaitQueue::new(),
            value,
        }
    }

    /// Consumes the monitor, returning the value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: ?Sized> MonitorObject<T> {
    /// Acquires the monitor, blocking unless the calling thread already holds it.
    pub fn lock(&self) -> MonitorGuard<'_, T> {
        self.raw.lock();
        MonitorGuard::new(self)
    }

    /// Acquires the monitor if that does not require blocking.
    pub fn try_lock(&self) -> Option<MonitorGuard<'_, T>> {
        self.raw.try_lock().then(|| MonitorGuard::new(self))
    }

    /// Runs `body` with the monitor held.
    ///
    /// The monitor is released on every exit path, including unwinding.
    pub fn synchronized<R, F>(&self, body: F) -> R
    where
        F: FnOnce(&MonitorGuard<'_, T>) -> R,
    {
        let guard = self.lock();
        body(&guard)
    }

    /// Returns `true` if the calling thread holds the monitor.
    pub fn is_held_by_current_thread(&self) -> bool {
        self.raw.is_owned_by_current_thread()
    }

    /// Mutable access without locking; `&mut self` proves exclusivity.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Acquires the monitor and waits on it. See [`MonitorGuard::wait`].
    ///
    /// # Errors
    /// As [`MonitorGuard::wait`].
    pub fn wait(&self, timeout: Option<Duration>) -> Result<WaitOutcome> {
        self.synchronized(|guard| guard.wait(timeout))
    }

    /// Acquires the monitor and waits for `condition`. See
    /// [`MonitorGuard::wait_until`].
    ///
    /// # Errors
    /// As [`MonitorGuard::wait`].
    pub fn wait_until<F>(&self, timeout: Option<Duration>, condition: F) -> Result<bool>
    where
        F: FnMut(&T) -> bool,
    {
        self.synchronized(|guard| guard.wait_until(timeout, condition))
    }

    /// Acquires the monitor and wakes one waiter.
    pub fn signal(&self) -> bool {
        self.synchronized(|guard| guard.signal())
    }

    /// Acquires the monitor and wakes every waiter.
    pub fn broadcast(&self) -> usize {
        self.synchronized(|guard| guard.broadcast())
    }
}

impl<T: ?Sized> Fenced for MonitorObject<T> {}

impl<T: Default> Default for MonitorObject<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for MonitorObject<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for MonitorObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("MonitorObject");
        match self.try_lock() {
            Some(guard) => d.field("value", &&*guard),
            None => d.field("value", &format_args!("<locked>")),
        };
        d.finish_non_exhaustive()
    }
}

/// Proof that the current thread holds a [`MonitorObject`].
///
/// Dropping the guard leaves one level of recursion. The guard cannot cross
/// threads.
#[must_use = "if unused the monitor is released immediately"]
pub struct MonitorGuard<'a, T: ?Sized> {
    monitor: &'a MonitorObject<T>,
    _not_send: PhantomData<*const ()>,
}

impl<'a, T: ?Sized> MonitorGuard<'a, T> {
    fn new(monitor: &'a MonitorObject<T>) -> Self {
        Self {
            monitor,
            _not_send: PhantomData,
        }
    }

    /// The monitor this guard holds.
    pub fn monitor(&self) -> &'a MonitorObject<T> {
        self.monitor
    }

    /// Releases the monitor and blocks until notified, timed out or
    /// interrupted; the monitor is held again (at the same recursion depth)
    /// when this returns, whatever the outcome.
    ///
    /// `None` waits indefinitely. Wakeups can be spurious: callers should
    /// re-check their condition, or use [`wait_until`](Self::wait_until).
    ///
    /// Any exit other than consuming a notification passes a notification on
    /// to another waiter, so a signal that races with a timeout or interrupt
    /// is never lost.
    ///
    /// # Errors
    /// [`Error::Cancelled`] if the thread is interrupted, either before it
    /// blocks (nothing is released in that case) or while blocked. The
    /// interrupt is consumed.
    pub fn wait(&self, timeout: Option<Duration>) -> Result<WaitOutcome> {
        if let Some(message) = interrupt::take() {
            debug_event!(%message, "wait cancelled before blocking");
            return Err(Error::Cancelled(message));
        }

        let monitor = self.monitor;
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let node = WaitNode::new();
        let node_ptr = NonNull::from(&node);

        // SAFETY: `node` stays on this frame until it is either popped by a
        // notifier (observed through `is_notified`) or removed below.
        unsafe { monitor.waiters.push(node_ptr) };
        // SAFETY: the guard proves this thread holds the lock.
        let depth = unsafe { monitor.raw.release_all() };
        trace_event!(depth, ?timeout, "monitor wait parked");

        let mut interrupted = false;
        loop {
            if node.is_notified() {
                break;
            }
            if interrupt::is_interrupted() {
                interrupted = true;
                break;
            }
            match deadline {
                None => thread::park(),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    thread::park_timeout(deadline - now);
                }
            }
        }

        // SAFETY: pushed above; a `false` return means a notifier already
        // unlinked it and will not touch it again.
        let still_queued = unsafe { monitor.waiters.remove(node_ptr) };
        monitor.raw.reacquire(depth);

        if let Some(message) = interrupted.then(interrupt::take).flatten() {
            debug_event!(%message, "wait interrupted, passing notification on");
            monitor.waiters.notify_one();
            return Err(Error::Cancelled(message));
        }
        if still_queued {
            trace_event!("wait timed out, passing notification on");
            monitor.waiters.notify_one();
            Ok(WaitOutcome::TimedOut)
        } else {
            Ok(WaitOutcome::Notified)
        }
    }

    /// [`wait`](Self::wait) with the timeout in seconds.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for a negative or NaN timeout, checked
    /// before anything else; otherwise as [`wait`](Self::wait).
    pub fn wait_secs(&self, seconds: Option<f64>) -> Result<WaitOutcome> {
        let timeout = match seconds {
            Some(seconds) => timeout_from_secs(seconds)?,
            None => None,
        };
        self.wait(timeout)
    }

    /// Waits until `condition` holds or `timeout` elapses, absorbing spurious
    /// wakeups. Returns the last value of `condition`.
    ///
    /// `condition` is evaluated with the monitor held.
    ///
    /// # Errors
    /// As [`wait`](Self::wait).
    pub fn wait_until<F>(&self, timeout: Option<Duration>, mut condition: F) -> Result<bool>
    where
        F: FnMut(&T) -> bool,
    {
        let Some(deadline) = timeout.and_then(|t| Instant::now().checked_add(t)) else {
            while !condition(&self.monitor.value) {
                self.wait(None)?;
            }
            return Ok(true);
        };
        loop {
            let met = condition(&self.monitor.value);
            let now = Instant::now();
            if met || now >= deadline {
                return Ok(met);
            }
            self.wait(Some(deadline - now))?;
        }
    }

    /// Wakes at most one waiter. No-op if nobody waits.
    ///
    /// Returns `true` if a waiter was woken.
    pub fn signal(&self) -> bool {
        let woken = self.monitor.waiters.notify_one();
        trace_event!(woken, "monitor signal");
        woken
    }

    /// Wakes every current waiter. No-op if nobody waits.
    ///
    /// Returns how many waiters were woken.
    pub fn broadcast(&self) -> usize {
        let woken = self.monitor.waiters.notify_all();
        trace_event!(woken, "monitor broadcast");
        woken
    }

    /// Returns `true` if at least one thread is waiting.
    pub fn has_waiters(&self) -> bool {
        !self.monitor.waiters.is_empty()
    }

    /// Number of threads currently in the wait set.
    pub fn waiter_count(&self) -> usize {
        self.monitor.waiters.len()
    }
}

impl<T: ?Sized> Deref for MonitorGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.monitor.value
    }
}

impl<T: ?Sized> Drop for MonitorGuard<'_, T> {
    fn drop(&mut self) {
        // SAFETY: the guard was created by a successful lock on this thread.
        unsafe { self.monitor.raw.unlock() };
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for MonitorGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// Validates a timeout in seconds. Values too large for a `Duration` mean
/// "wait indefinitely".
fn timeout_from_secs(seconds: f64) -> Result<Option<Duration>> {
    if seconds.is_nan() || seconds < 0.0 {
        return Err(Error::invalid_argument("time interval must be non-negative"));
    }
    Ok(Duration::try_from_secs_f64(seconds).ok())
}
