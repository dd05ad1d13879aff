use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, RwLock};
use std::thread;
use synchro::{AtomicCell, AtomicCounter, MonitorObject};

const THREADS: usize = 4;
const OPS: usize = 1_000;

fn bench_counter(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter_increment");

    group.bench_function("std_mutex_i64", |b| {
        b.iter(|| {
            let value = Mutex::new(0_i64);
            thread::scope(|s| {
                for _ in 0..THREADS {
                    s.spawn(|| {
                        for _ in 0..OPS {
                            *value.lock().unwrap() += 1;
                        }
                    });
                }
            });
            black_box(value.into_inner().unwrap())
        })
    });

    group.bench_function("atomic_counter", |b| {
        b.iter(|| {
            let counter = AtomicCounter::new(0);
            thread::scope(|s| {
                for _ in 0..THREADS {
                    s.spawn(|| {
                        for _ in 0..OPS {
                            counter.increment();
                        }
                    });
                }
            });
            black_box(counter.value())
        })
    });

    group.bench_function("atomic_counter_update", |b| {
        b.iter(|| {
            let counter = AtomicCounter::new(0);
            thread::scope(|s| {
                for _ in 0..THREADS {
                    s.spawn(|| {
                        for _ in 0..OPS {
                            counter.update(|v| v + 1);
                        }
                    });
                }
            });
            black_box(counter.value())
        })
    });

    group.finish();
}

fn bench_cell_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("cell_read_mostly");

    group.bench_function("std_rwlock", |b| {
        let slot = RwLock::new(vec![1_u64; 16]);
        b.iter(|| {
            thread::scope(|s| {
                for t in 0..THREADS {
                    let slot = &slot;
                    s.spawn(move || {
                        for i in 0..OPS {
                            if t == 0 && i % 64 == 0 {
                                slot.write().unwrap()[0] = i as u64;
                            } else {
                                black_box(slot.read().unwrap()[0]);
                            }
                        }
                    });
                }
            });
        })
    });

    group.bench_function("atomic_cell", |b| {
        let cell = AtomicCell::new(vec![1_u64; 16]);
        b.iter(|| {
            thread::scope(|s| {
                for t in 0..THREADS {
                    let cell = &cell;
                    s.spawn(move || {
                        for i in 0..OPS {
                            if t == 0 && i % 64 == 0 {
                                cell.update(|v| {
                                    let mut next = v.clone();
                                    next[0] = i as u64;
                                    next
                                });
                            } else {
                                black_box(cell.load()[0]);
                            }
                        }
                    });
                }
            });
        })
    });

    group.finish();
}

fn bench_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("ping_pong");

    group.bench_function("std_mutex_condvar", |b| {
        b.iter(|| {
            let turn = Mutex::new(false);
            let cv = Condvar::new();
            thread::scope(|s| {
                for me in [false, true] {
                    let (turn, cv) = (&turn, &cv);
                    s.spawn(move || {
                        for _ in 0..OPS / 10 {
                            let mut g = cv.wait_while(turn.lock().unwrap(), |t| *t != me).unwrap();
                            *g = !me;
                            cv.notify_all();
                        }
                    });
                }
            });
        })
    });

    group.bench_function("monitor_object", |b| {
        b.iter(|| {
            let turn = MonitorObject::new(AtomicBool::new(false));
            thread::scope(|s| {
                for me in [false, true] {
                    let turn = &turn;
                    s.spawn(move || {
                        for _ in 0..OPS / 10 {
                            turn.synchronized(|g| {
                                g.wait_until(None, |t| t.load(Ordering::Relaxed) == me).unwrap();
                                g.store(!me, Ordering::Relaxed);
                                g.broadcast();
                            });
                        }
                    });
                }
            });
        })
    });

    group.bench_function("monitor_uncontended_reentry", |b| {
        let monitor = MonitorObject::new(0_u64);
        b.iter(|| {
            monitor.synchronized(|outer| {
                monitor.synchronized(|inner| black_box(**outer + **inner))
            })
        })
    });

    group.finish();
}

criterion_group!(benches, bench_counter, bench_cell_reads, bench_handoff);
criterion_main!(benches);
