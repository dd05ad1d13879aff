use std::cell::{Cell, RefCell};

use synchro::{
    AtomicCell, AtomicCounter, AtomicFlag, InterruptHandle, Monitor, MonitorObject, Volatile,
    VolatileFields,
};

fn assert_send<T: Send>() {}
fn assert_sync<T: Sync>() {}

#[test]
fn atomics_are_send_and_sync() {
    assert_send::<AtomicCounter>();
    assert_sync::<AtomicCounter>();
    assert_send::<AtomicFlag>();
    assert_sync::<AtomicFlag>();
    assert_send::<AtomicCell<String>>();
    assert_sync::<AtomicCell<String>>();
}

#[test]
fn monitor_shares_send_only_data() {
    // `Cell` and `RefCell` are `!Sync`, but the monitor serializes access.
    assert_sync::<MonitorObject<Cell<u64>>>();
    assert_sync::<MonitorObject<RefCell<Vec<u8>>>>();
    assert_send::<MonitorObject<RefCell<Vec<u8>>>>();
    assert_sync::<Monitor>();
}

#[test]
fn fence_types_are_send_and_sync() {
    assert_send::<Volatile<u64>>();
    assert_sync::<Volatile<u64>>();
    assert_sync::<VolatileFields<String>>();
}

#[test]
fn interrupt_handles_cross_threads() {
    assert_send::<InterruptHandle>();
    assert_sync::<InterruptHandle>();
}
