//! Cooperative thread interruption.
//!
//! Rust threads cannot be interrupted preemptively, so interruption is a flag
//! per thread plus an `unpark`. [`MonitorGuard::wait`](super::MonitorGuard::wait)
//! checks the flag before blocking and after every wakeup, and reports it as
//! [`Error::Cancelled`](crate::Error::Cancelled).
//!
//! ```rust
//! use std::thread;
//! use synchro::{interrupt, Monitor};
//!
//! let monitor = &Monitor::default();
//! let (tx, rx) = std::sync::mpsc::channel();
//!
//! thread::scope(|s| {
//!     let waiter = s.spawn(move || {
//!         tx.send(interrupt::current()).unwrap();
//!         monitor.synchronized(|guard| loop {
//!             // Loop so a stray wakeup cannot end the wait early.
//!             if let Err(err) = guard.wait(None) {
//!                 return err;
//!             }
//!         })
//!     });
//!     rx.recv().unwrap().interrupt_with("shutting down");
//!     let err = waiter.join().unwrap();
//!     assert_eq!(err.to_string(), "cancelled: shutting down");
//! });
//! ```

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, Thread};

use arc_swap::ArcSwapOption;

use crate::config::DEFAULT_INTERRUPT_MESSAGE;

struct InterruptState {
    pending: AtomicBool,
    message: ArcSwapOption<String>,
    thread: Thread,
}

thread_local! {
    static CURRENT: Arc<InterruptState> = Arc::new(InterruptState {
        pending: AtomicBool::new(false),
        message: ArcSwapOption::empty(),
        thread: thread::current(),
    });
}

/// A handle for interrupting one particular thread. Cheap to clone and send.
#[derive(Clone)]
pub struct InterruptHandle {
    state: Arc<InterruptState>,
}

impl InterruptHandle {
    /// Marks the thread interrupted with the default message and wakes it if
    /// it is blocked in a monitor wait.
    pub fn interrupt(&self) {
        self.raise(None);
    }

    /// Like [`interrupt`](Self::interrupt), attaching `message` to the
    /// resulting [`Error::Cancelled`](crate::Error::Cancelled).
    pub fn interrupt_with(&self, message: impl Into<String>) {
        self.raise(Some(Arc::new(message.into())));
    }

    /// Returns `true` while an interrupt is pending (not yet consumed).
    pub fn is_interrupted(&self) -> bool {
        self.state.pending.load(Ordering::Acquire)
    }

    /// The thread this handle interrupts.
    pub fn thread(&self) -> &Thread {
        &self.state.thread
    }

    fn raise(&self, message: Option<Arc<String>>) {
        self.state.message.store(message);
        self.state.pending.store(true, Ordering::Release);
        self.state.thread.unpark();
    }
}

impl fmt::Debug for InterruptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptHandle")
            .field("thread", &self.state.thread.id())
            .field("pending", &self.is_interrupted())
            .finish()
    }
}

/// Returns a handle that interrupts the calling thread.
pub fn current() -> InterruptHandle {
    InterruptHandle {
        state: CURRENT.with(Arc::clone),
    }
}

/// Returns `true` if the calling thread has a pending interrupt.
pub fn is_interrupted() -> bool {
    CURRENT.with(|state| state.pending.load(Ordering::Acquire))
}

/// Consumes the calling thread's pending interrupt, returning its message.
pub fn take() -> Option<String> {
    CURRENT.with(|state| {
        if !state.pending.swap(false, Ordering::AcqRel) {
            return None;
        }
        let message = state
            .message
            .swap(None)
            .map_or_else(|| DEFAULT_INTERRUPT_MESSAGE.to_owned(), Arc::unwrap_or_clone);
        Some(message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_consumes_the_interrupt() {
        assert_eq!(take(), None);
        current().interrupt();
        assert!(is_interrupted());
        assert_eq!(take().as_deref(), Some(DEFAULT_INTERRUPT_MESSAGE));
        assert!(!is_interrupted());
        assert_eq!(take(), None);
    }

    #[test]
    fn message_travels_with_the_interrupt() {
        let handle = thread::spawn(current).join().unwrap();
        assert!(!handle.is_interrupted());

        let here = current();
        here.interrupt_with("stop");
        assert!(here.is_interrupted());
        assert_eq!(take().as_deref(), Some("stop"));
        assert_eq!(here.thread().id(), thread::current().id());
    }

    #[test]
    fn interrupt_from_another_thread() {
        let here = current();
        thread::scope(|s| {
            s.spawn(|| here.interrupt());
        });
        assert!(is_interrupted());
        assert!(take().is_some());
    }
}
