//! Reentrant lock word underlying `MonitorObject`.

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use super::{wait_on_u32, wake_one_u32};
use crate::macros::trace_event;

const UNLOCKED: u32 = 0;
const LOCKED: u32 = 1;
const CONTENDED: u32 = 2;

/// A non-zero identifier, never reused for the life of the process.
#[inline]
pub(crate) fn current_thread_id() -> usize {
    static NEXT_ID: AtomicUsize = AtomicUsize::new(1);
    thread_local!(static ID: Cell<usize> = const { Cell::new(0) });
    ID.with(|id| match id.get() {
        0 => {
            let fresh = NEXT_ID.fetch_add(1, Ordering::Relaxed);
            id.set(fresh);
            fresh
        }
        assigned => assigned,
    })
}

/// Three-state futex lock (unlocked / locked / contended) plus an owner id and
/// a recursion depth for reentrancy.
///
/// `owner` and `depth` are only written by the thread that holds the lock, so
/// relaxed accesses suffice: a thread can only ever read its own id back.
pub(crate) struct RawMonitor {
    state: AtomicU32,
    owner: AtomicUsize,
    depth: AtomicUsize,
    spin_limit: u32,
}

impl RawMonitor {
    pub(crate) const fn new(spin_limit: u32) -> Self {
        Self {
            state: AtomicU32::new(UNLOCKED),
            owner: AtomicUsize::new(0),
            depth: AtomicUsize::new(0),
            spin_limit,
        }
    }

    /// Acquires the lock, re-entering if the calling thread already holds it.
    pub(crate) fn lock(&self) {
        let me = current_thread_id();
        if self.owner.load(Ordering::Relaxed) == me {
            self.depth.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.acquire();
        self.set_owner(me, 1);
    }

    /// Acquires the lock without blocking.
    pub(crate) fn try_lock(&self) -> bool {
        let me = current_thread_id();
        if self.owner.load(Ordering::Relaxed) == me {
            self.depth.fetch_add(1, Ordering::Relaxed);
            return true;
        }
        if self
            .state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            self.set_owner(me, 1);
            true
        } else {
            false
        }
    }

    pub(crate) fn is_owned_by_current_thread(&self) -> bool {
        self.owner.load(Ordering::Relaxed) == current_thread_id()
    }

    /// Leaves one level of recursion, releasing the lock at the outermost.
    ///
    /// # Safety
    /// The calling thread must hold the lock.
    pub(crate) unsafe fn unlock(&self) {
        debug_assert!(self.is_owned_by_current_thread());
        if self.depth.fetch_sub(1, Ordering::Relaxed) == 1 {
            self.owner.store(0, Ordering::Relaxed);
            self.release();
        }
    }

    /// Releases every recursion level at once and returns the depth so that
    /// [`reacquire`](Self::reacquire) can restore it.
    ///
    /// # Safety
    /// The calling thread must hold the lock.
    pub(crate) unsafe fn release_all(&self) -> usize {
        debug_assert!(self.is_owned_by_current_thread());
        let depth = self.depth.swap(0, Ordering::Relaxed);
        self.owner.store(0, Ordering::Relaxed);
        self.release();
        depth
    }

    /// Blocks until the lock is held again at recursion `depth`.
    pub(crate) fn reacquire(&self, depth: usize) {
        self.acquire();
        self.set_owner(current_thread_id(), depth);
    }

    #[inline]
    fn set_owner(&self, me: usize, depth: usize) {
        self.owner.store(me, Ordering::Relaxed);
        self.depth.store(depth, Ordering::Relaxed);
    }

    #[inline]
    fn acquire(&self) {
        if self
            .state
            .compare_exchange(UNLOCKED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            self.acquire_slow();
        }
    }

    #[cold]
    fn acquire_slow(&self) {
        let mut spins = 0;
        let mut state = self.state.load(Ordering::Relaxed);
        loop {
            if state == UNLOCKED {
                match self.state.compare_exchange_weak(
                    UNLOCKED,
                    LOCKED,
                    Ordering::Acquire,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => return,
                    Err(s) => state = s,
                }
                continue;
            }

            if spins < self.spin_limit {
                spins += 1;
                core::hint::spin_loop();
                state = self.state.load(Ordering::Relaxed);
                continue;
            }

            // Past the spin budget: advertise a waiter, then park. Once we have
            // parked we must keep acquiring as CONTENDED, since other sleepers
            // may still be queued behind us.
            if state == LOCKED || state == UNLOCKED {
                state = self.state.swap(CONTENDED, Ordering::Acquire);
                if state == UNLOCKED {
                    return;
                }
            }
            trace_event!("monitor lock contended, parking");
            wait_on_u32(&self.state, CONTENDED);
            state = self.state.swap(CONTENDED, Ordering::Acquire);
            if state == UNLOCKED {
                return;
            }
        }
    }

    #[inline]
    fn release(&self) {
        if self.state.swap(UNLOCKED, Ordering::Release) == CONTENDED {
            wake_one_u32(&self.state);
        }
    }
}
