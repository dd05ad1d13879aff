//! A countdown latch built from a monitor and an atomic counter.

use std::thread;
use std::time::Duration;

use synchro::{AtomicCounter, Monitor, Result};

struct CountDownLatch {
    count: AtomicCounter,
    monitor: Monitor,
}

impl CountDownLatch {
    fn new(count: u32) -> Self {
        Self {
            count: AtomicCounter::new(i64::from(count)),
            monitor: Monitor::default(),
        }
    }

    fn count_down(&self) {
        // Never drop below zero.
        let remaining = self.count.update(|c| (c - 1).max(0));
        if remaining == 0 {
            self.monitor.broadcast();
        }
    }

    /// Returns `true` if the count reached zero before the timeout.
    fn wait(&self, timeout: Option<Duration>) -> Result<bool> {
        self.monitor
            .wait_until(timeout, |()| self.count.value() == 0)
    }

    fn count(&self) -> i64 {
        self.count.value()
    }
}

fn main() -> Result<()> {
    println!("CountDownLatch Example");
    println!("======================");

    let latch = CountDownLatch::new(3);

    // Times out: nobody has counted down yet.
    let early = latch.wait(Some(Duration::from_millis(20)))?;
    println!("  Released before any worker ran: {early}");

    thread::scope(|s| {
        for id in 0..3_u64 {
            let latch = &latch;
            s.spawn(move || {
                thread::sleep(Duration::from_millis(10 * (id + 1)));
                println!("  Worker {id} done");
                latch.count_down();
            });
        }

        let released = latch.wait(None)?;
        println!("  Released: {released}, remaining count: {}", latch.count());
        Ok(())
    })
}
