use core::cell::UnsafeCell;
use core::marker::PhantomPinned;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, Thread};

/// A parked waiter. Lives on the waiting thread's stack and must stay in place
/// until it has been popped or removed from its queue.
pub(crate) struct WaitNode {
    thread: Thread,
    next: UnsafeCell<Option<NonNull<WaitNode>>>,
    notified: AtomicBool,
    _pin: PhantomPinned,
}

impl WaitNode {
    pub(crate) fn new() -> Self {
        Self {
            thread: thread::current(),
            next: UnsafeCell::new(None),
            notified: AtomicBool::new(false),
            _pin: PhantomPinned,
        }
    }

    /// Set once a notifier has popped this node.
    #[inline]
    pub(crate) fn is_notified(&self) -> bool {
        self.notified.load(Ordering::Acquire)
    }
}

/// FIFO queue of waiting threads, guarded by a small spin lock.
///
/// Notification order is FIFO today, but callers must not rely on it.
pub(crate) struct WaitQueue {
    head: UnsafeCell<Option<NonNull<WaitNode>>>,
    tail: UnsafeCell<Option<NonNull<WaitNode>>>,
    lock: AtomicBool,
}

impl WaitQueue {
    pub(crate) const fn new() -> Self {
        Self {
            head: UnsafeCell::new(None),
            tail: UnsafeCell::new(None),
            lock: AtomicBool::new(false),
        }
    }

    fn lock(&self) {
        while self.lock.swap(true, Ordering::Acquire) {
            while self.lock.load(Ordering::Relaxed) {
                core::hint::spin_loop();
            }
        }
    }

    fn unlock(&self) {
        self.lock.store(false, Ordering::Release);
    }

    /// Appends `node`.
    ///
    /// # Safety
    /// `node` must stay valid and unmoved until [`remove`](Self::remove)
    /// returns for it or it is observed as notified.
    pub(crate) unsafe fn push(&self, node: NonNull<WaitNode>) {
        self.lock();
        *node.as_ref().next.get() = None;
        match *self.tail.get() {
            Some(tail) => *tail.as_ref().next.get() = Some(node),
            None => *self.head.get() = Some(node),
        }
        *self.tail.get() = Some(node);
        self.unlock();
    }

    /// Unlinks `node` if it is still queued. Returns `false` if a notifier
    /// already popped it.
    ///
    /// # Safety
    /// `node` must have been pushed onto this queue.
    pub(crate) unsafe fn remove(&self, node: NonNull<WaitNode>) -> bool {
        self.lock();
        let mut prev: Option<NonNull<WaitNode>> = None;
        let mut cursor = *self.head.get();
        let mut found = false;
        while let Some(current) = cursor {
            let next = *current.as_ref().next.get();
            if current == node {
                match prev {
                    Some(p) => *p.as_ref().next.get() = next,
                    None => *self.head.get() = next,
                }
                if *self.tail.get() == Some(node) {
                    *self.tail.get() = prev;
                }
                found = true;
                break;
            }
            prev = cursor;
            cursor = next;
        }
        self.unlock();
        found
    }

    /// Wakes the longest-waiting thread. Returns `false` if the queue was empty.
    pub(crate) fn notify_one(&self) -> bool {
        self.lock();
        // SAFETY: the queue lock is held; queued nodes are valid until popped.
        let thread = unsafe { self.pop_locked() };
        self.unlock();
        match thread {
            Some(thread) => {
                thread.unpark();
                true
            }
            None => false,
        }
    }

    /// Wakes every queued thread. Returns how many were woken.
    pub(crate) fn notify_all(&self) -> usize {
        let mut woken = Vec::new();
        self.lock();
        // SAFETY: as in `notify_one`.
        while let Some(thread) = unsafe { self.pop_locked() } {
            woken.push(thread);
        }
        self.unlock();
        let count = woken.len();
        for thread in woken {
            thread.unpark();
        }
        count
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock();
        // SAFETY: the queue lock is held.
        let empty = unsafe { (*self.head.get()).is_none() };
        self.unlock();
        empty
    }

    pub(crate) fn len(&self) -> usize {
        self.lock();
        let mut len = 0;
        // SAFETY: the queue lock is held; queued nodes are valid.
        let mut cursor = unsafe { *self.head.get() };
        while let Some(node) = cursor {
            len += 1;
            cursor = unsafe { *node.as_ref().next.get() };
        }
        self.unlock();
        len
    }

    /// Pops the head, marks it notified, and returns a handle to its thread.
    ///
    /// The thread handle is cloned *before* `notified` is published: once the
    /// waiter sees the flag it may return and free the node.
    ///
    /// # Safety
    /// Caller must hold the queue lock.
    unsafe fn pop_locked(&self) -> Option<Thread> {
        let head = (*self.head.get())?;
        let node = head.as_ref();
        *self.head.get() = *node.next.get();
        if (*self.head.get()).is_none() {
            *self.tail.get() = None;
        }
        let thread = node.thread.clone();
        node.notified.store(true, Ordering::Release);
        Some(thread)
    }
}

// SAFETY: all access to the intrusive list goes through the spin lock.
unsafe impl Sync for WaitQueue {}
unsafe impl Send for WaitQueue {}
