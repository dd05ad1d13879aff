use super::*;
use crate::Error;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::cell::Cell;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Spins until `monitor` has at least one waiter queued.
fn await_waiter<T: ?Sized>(monitor: &MonitorObject<T>) {
    while !monitor.synchronized(|guard| guard.has_waiters()) {
        thread::yield_now();
    }
}

#[test]
fn test_synchronized_is_reentrant() {
    let monitor = MonitorObject::new(Cell::new(0));
    let depth = monitor.synchronized(|a| {
        a.set(1);
        monitor.synchronized(|b| {
            b.set(b.get() + 1);
            monitor.synchronized(|c| c.get() + 1)
        })
    });
    assert_eq!(depth, 3);
    assert!(!monitor.is_held_by_current_thread());
}

#[test]
fn test_monitor_contention() {
    let monitor = MonitorObject::new(Cell::new(0_u32));
    let monitor = &monitor;

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(move || {
                for _ in 0..500 {
                    monitor.synchronized(|guard| guard.set(guard.get() + 1));
                }
            });
        }
    });

    assert_eq!(monitor.synchronized(|guard| guard.get()), 2_000);
}

#[test]
fn test_try_lock_fails_while_held_elsewhere() {
    let monitor = Monitor::default();
    let guard = monitor.lock();
    assert!(monitor.try_lock().is_some(), "reentrant try_lock");
    thread::scope(|s| {
        assert!(s.spawn(|| monitor.try_lock().is_none()).join().unwrap());
    });
    drop(guard);
    thread::scope(|s| {
        assert!(s.spawn(|| monitor.try_lock().is_some()).join().unwrap());
    });
}

#[test]
fn test_panic_in_body_releases_lock() {
    let monitor = Arc::new(Monitor::default());
    let inner = Arc::clone(&monitor);
    let result = thread::spawn(move || {
        inner.synchronized(|_| panic!("boom"));
    })
    .join();
    assert!(result.is_err());
    assert!(monitor.try_lock().is_some());
}

#[test]
fn test_wait_releases_and_reacquires() {
    let monitor = MonitorObject::new(AtomicBool::new(false));
    let monitor = &monitor;

    thread::scope(|s| {
        let waiter = s.spawn(move || {
            monitor.synchronized(|guard| {
                while !guard.load(Ordering::Relaxed) {
                    guard.wait(None).unwrap();
                }
                monitor.is_held_by_current_thread()
            })
        });

        await_waiter(monitor);
        monitor.synchronized(|guard| {
            guard.store(true, Ordering::Relaxed);
            guard.signal();
        });
        assert!(waiter.join().unwrap());
    });
}

#[test]
fn test_wait_restores_recursion_depth() {
    let monitor = Monitor::default();
    let monitor = &monitor;

    thread::scope(|s| {
        let waiter = s.spawn(move || {
            let outer = monitor.lock();
            let inner = monitor.lock();
            let outcome = inner.wait(None).unwrap();
            drop(inner);
            // Still held through `outer`.
            let held = monitor.is_held_by_current_thread();
            drop(outer);
            (outcome, held, monitor.is_held_by_current_thread())
        });

        await_waiter(monitor);
        assert!(monitor.signal());
        let (outcome, held_after_inner, held_after_outer) = waiter.join().unwrap();
        assert_eq!(outcome, WaitOutcome::Notified);
        assert!(held_after_inner);
        assert!(!held_after_outer);
    });
}

#[test]
fn test_wait_times_out_without_signal() {
    let monitor = Monitor::default();
    let start = Instant::now();
    let outcome = monitor.wait(Some(Duration::from_millis(50))).unwrap();
    assert_eq!(outcome, WaitOutcome::TimedOut);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_secs(1), "timed wait overslept: {elapsed:?}");
    assert!(monitor.try_lock().is_some());
}

#[test]
fn test_zero_timeout_returns_immediately() {
    let monitor = Monitor::default();
    let outcome = monitor.synchronized(|guard| guard.wait_secs(Some(0.0))).unwrap();
    assert!(outcome.timed_out());
}

#[test]
fn test_negative_timeout_rejected_without_releasing() {
    let monitor = Monitor::default();
    monitor.synchronized(|guard| {
        let err = guard.wait_secs(Some(-1.0)).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(monitor.is_held_by_current_thread());
        thread::scope(|s| {
            assert!(s.spawn(|| monitor.try_lock().is_none()).join().unwrap());
        });
    });
}

#[test]
fn test_pre_interrupted_wait_fails_fast() {
    let monitor = Monitor::default();
    interrupt::current().interrupt();
    let start = Instant::now();
    monitor.synchronized(|guard| {
        let err = guard.wait(None).unwrap_err();
        assert!(err.is_cancelled());
        assert!(monitor.is_held_by_current_thread());
        thread::scope(|s| {
            assert!(s.spawn(|| monitor.try_lock().is_none()).join().unwrap());
        });
    });
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(!interrupt::is_interrupted(), "interrupt consumed");
}

#[test]
fn test_interrupt_during_wait() {
    let monitor = Monitor::default();
    let monitor = &monitor;
    let (tx, rx) = std::sync::mpsc::channel();

    thread::scope(|s| {
        let waiter = s.spawn(move || {
            tx.send(interrupt::current()).unwrap();
            monitor.synchronized(|guard| {
                let result = loop {
                    match guard.wait(None) {
                        Ok(_) => continue,
                        Err(err) => break err,
                    }
                };
                (result, monitor.is_held_by_current_thread())
            })
        });

        let handle = rx.recv().unwrap();
        await_waiter(monitor);
        handle.interrupt_with("stop waiting");
        let (err, held) = waiter.join().unwrap();
        assert_eq!(err, Error::Cancelled("stop waiting".into()));
        assert!(held);
    });
}

#[test]
fn test_broadcast_wakes_all() {
    const WAITERS: usize = 4;
    let monitor = MonitorObject::new(AtomicBool::new(false));
    let monitor = &monitor;
    let woken = AtomicUsize::new(0);
    let woken = &woken;

    thread::scope(|s| {
        for _ in 0..WAITERS {
            s.spawn(move || {
                monitor
                    .wait_until(None, |go| go.load(Ordering::Relaxed))
                    .unwrap();
                woken.fetch_add(1, Ordering::Relaxed);
            });
        }

        while monitor.synchronized(|guard| guard.waiter_count()) < WAITERS {
            thread::yield_now();
        }
        monitor.synchronized(|guard| {
            guard.store(true, Ordering::Relaxed);
            guard.broadcast();
        });
    });

    assert_eq!(woken.load(Ordering::Relaxed), WAITERS);
}

#[test]
fn test_signal_wakes_one_of_many() {
    let monitor = MonitorObject::new(AtomicUsize::new(0));
    let monitor = &monitor;
    let done = AtomicUsize::new(0);
    let done = &done;

    thread::scope(|s| {
        for _ in 0..3 {
            s.spawn(move || {
                monitor
                    .wait_until(None, |tickets| {
                        tickets
                            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |t| t.checked_sub(1))
                            .is_ok()
                    })
                    .unwrap();
                done.fetch_add(1, Ordering::Relaxed);
            });
        }

        for round in 1..=3 {
            await_waiter(monitor);
            monitor.synchronized(|guard| {
                guard.fetch_add(1, Ordering::Relaxed);
                guard.signal();
            });
            while done.load(Ordering::Relaxed) < round {
                thread::yield_now();
            }
        }
    });

    assert_eq!(done.load(Ordering::Relaxed), 3);
}

#[test]
fn test_wait_until_times_out_with_false() {
    let monitor = Monitor::default();
    let met = monitor
        .wait_until(Some(Duration::from_millis(20)), |()| false)
        .unwrap();
    assert!(!met);
    let met = monitor.wait_until(Some(Duration::ZERO), |()| true).unwrap();
    assert!(met);
}

#[test]
fn test_timed_out_waiter_passes_notification_on() {
    // Two waiters; one times out while the other waits forever. The timeout
    // path re-signals, so the indefinite waiter is released without anyone
    // else calling `signal`.
    let monitor = Monitor::default();
    let monitor = &monitor;
    let barrier = Barrier::new(2);
    let barrier = &barrier;

    thread::scope(|s| {
        let forever = s.spawn(move || {
            monitor.synchronized(|guard| {
                barrier.wait();
                guard.wait(None).unwrap()
            })
        });

        barrier.wait();
        await_waiter(monitor);
        let outcome = monitor.wait(Some(Duration::from_millis(10))).unwrap();
        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert_eq!(forever.join().unwrap(), WaitOutcome::Notified);
    });
}

#[test]
fn test_interrupted_waiter_passes_notification_on() {
    // The interrupted waiter re-signals on its way out, releasing the other
    // waiter without any explicit `signal`.
    let monitor = Monitor::default();
    let monitor = &monitor;
    let (tx, rx) = std::sync::mpsc::channel();

    thread::scope(|s| {
        let interrupted = s.spawn(move || {
            tx.send(interrupt::current()).unwrap();
            monitor.wait(None)
        });
        let handle = rx.recv().unwrap();
        await_waiter(monitor);

        let patient = s.spawn(move || monitor.wait(None));
        while monitor.synchronized(|guard| guard.waiter_count()) < 2 {
            thread::yield_now();
        }

        handle.interrupt_with("leave");
        let err = interrupted.join().unwrap().unwrap_err();
        assert_eq!(err, Error::Cancelled("leave".into()));
        assert_eq!(patient.join().unwrap(), Ok(WaitOutcome::Notified));
    });
}

#[test]
fn test_wait_on_u32_wake() {
    let flag = Arc::new(AtomicU32::new(0));
    let barrier = Arc::new(Barrier::new(2));
    let flag_thread = Arc::clone(&flag);
    let barrier_thread = Arc::clone(&barrier);

    let handle = thread::spawn(move || {
        barrier_thread.wait();
        while flag_thread.load(Ordering::SeqCst) == 0 {
            wait_on_u32(&flag_thread, 0);
        }
        flag_thread.load(Ordering::SeqCst)
    });

    barrier.wait();
    flag.store(1, Ordering::SeqCst);
    wake_one_u32(&flag);

    assert_eq!(handle.join().unwrap(), 1);
}
