//! Blocking primitives: the reentrant monitor and its wait set.
//!
//! The monitor lock parks contended threads on its state word (futex on
//! Linux, `WaitOnAddress` on Windows, a yield loop elsewhere). Waiters on the
//! monitor's condition park through `std::thread::park` so that interrupts and
//! timeouts can wake them individually.

pub mod interrupt;
pub mod monitor;
mod raw_monitor;
mod wait_queue;

pub use interrupt::InterruptHandle;
pub use monitor::{MonitorGuard, MonitorObject, WaitOutcome};

/// A monitor that protects no data; use it for pure signalling.
pub type Monitor = MonitorObject<()>;

use core::sync::atomic::AtomicU32;
#[cfg(not(any(windows, target_os = "linux")))]
use core::sync::atomic::Ordering;

#[cfg(windows)]
use windows_sys::Win32::System::Threading::{WaitOnAddress, WakeByAddressSingle};

#[cfg(target_os = "linux")]
use libc::{SYS_futex, FUTEX_PRIVATE_FLAG, FUTEX_WAIT, FUTEX_WAKE};

#[cfg(target_os = "linux")]
#[inline]
fn futex_wait(addr: *const u32, expected: u32) {
    // SAFETY: `addr` points to a live `AtomicU32`; a null timeout blocks
    // until woken or the word no longer equals `expected`.
    unsafe {
        libc::syscall(
            SYS_futex,
            addr,
            FUTEX_WAIT | FUTEX_PRIVATE_FLAG,
            expected,
            core::ptr::null::<libc::timespec>(),
        );
    }
}

#[cfg(target_os = "linux")]
#[inline]
fn futex_wake(addr: *const u32, count: i32) {
    // SAFETY: `addr` points to a live `AtomicU32`.
    unsafe {
        libc::syscall(SYS_futex, addr, FUTEX_WAKE | FUTEX_PRIVATE_FLAG, count);
    }
}

/// Wakes one thread parked on `addr`.
#[inline]
pub(crate) fn wake_one_u32(addr: &AtomicU32) {
    #[cfg(windows)]
    // SAFETY: `addr` is a valid address for the duration of the call.
    unsafe {
        WakeByAddressSingle(addr.as_ptr().cast());
    }
    #[cfg(target_os = "linux")]
    {
        futex_wake(addr.as_ptr(), 1);
    }
    #[cfg(not(any(windows, target_os = "linux")))]
    let _ = addr;
}

/// Parks until `addr` no longer holds `expected`. May return spuriously.
#[inline]
pub(crate) fn wait_on_u32(addr: &AtomicU32, expected: u32) {
    #[cfg(windows)]
    // SAFETY: both pointers are valid for `size_of::<u32>()` bytes.
    unsafe {
        let expected_ptr = (&expected as *const u32).cast();
        WaitOnAddress(
            addr.as_ptr().cast(),
            expected_ptr,
            core::mem::size_of::<u32>(),
            u32::MAX,
        );
    }
    #[cfg(target_os = "linux")]
    {
        futex_wait(addr.as_ptr(), expected);
    }
    #[cfg(not(any(windows, target_os = "linux")))]
    while addr.load(Ordering::SeqCst) == expected {
        std::thread::yield_now();
    }
}

#[cfg(test)]
mod tests;
