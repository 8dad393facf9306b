//! Retained-state persistence across simulated sleep/wake boundaries.
//!
//! The `RtcStore` host backend stands in for RTC slow memory: a store
//! instance that lives across several "wake cycles" models memory that
//! survives deep sleep, and a fresh instance models a power loss.

use fanstat::adapters::rtc_store::RtcStore;
use fanstat::app::cycle::ControlCycle;
use fanstat::app::ports::RetainedStorePort;
use fanstat::config::SystemConfig;
use fanstat::retained::RetainedState;

use crate::mock_hw::{ManualClock, MockHardware, RecordingSink};

/// One full wake cycle against the store: load, on_wake, run the loop,
/// write the integral back.  Returns the boot count it ran as.
fn wake_cycle(store: &mut RtcStore, temps: &[f32]) -> u32 {
    let cfg = SystemConfig::default();
    let mut retained = store.load().unwrap_or_default();
    retained.on_wake();

    let mut hw = MockHardware::new();
    hw.push_temps(temps);
    let mut sink = RecordingSink::new();
    let clock = ManualClock::new();

    let mut cycle = ControlCycle::new(&cfg, retained.boot_count, retained.pid_integral);
    let result = cycle.run(&mut hw, &mut sink, &clock);

    retained.pid_integral = result.pid_integral;
    store.store(&retained);
    retained.boot_count
}

#[test]
fn boot_count_increments_across_wakes() {
    let mut store = RtcStore::new();
    assert_eq!(wake_cycle(&mut store, &[24.0, 24.0, 24.0]), 1);
    assert_eq!(wake_cycle(&mut store, &[24.0, 24.0, 24.0]), 2);
    assert_eq!(wake_cycle(&mut store, &[24.0, 24.0, 24.0]), 3);
}

#[test]
fn integral_carries_from_one_wake_to_the_next() {
    let mut store = RtcStore::new();

    // First wake ends with a warm room, leaving a positive integral.
    wake_cycle(&mut store, &[30.0, 27.0, 25.0, 24.3, 24.1, 24.0]);
    let after_first = store.load().unwrap();
    assert!(after_first.pid_integral > 0.0);

    // The next wake must see that exact value at controller seed time.
    let mut retained = store.load().unwrap();
    retained.on_wake();
    assert_eq!(
        retained.pid_integral.to_bits(),
        after_first.pid_integral.to_bits(),
        "warm wake must preserve the integral bit-for-bit"
    );
}

#[test]
fn power_loss_forgets_everything() {
    let mut store = RtcStore::new();
    wake_cycle(&mut store, &[30.0, 27.0, 25.0, 24.3, 24.1, 24.0]);
    wake_cycle(&mut store, &[24.0, 24.0, 24.0]);

    // A fresh store models the RTC domain losing power.
    let store_after_loss = RtcStore::new();
    assert!(store_after_loss.load().is_none());

    let mut retained = store_after_loss.load().unwrap_or_default();
    retained.on_wake();
    assert_eq!(retained.boot_count, 1, "counting restarts after power loss");
    assert_eq!(retained.pid_integral, 0.0);
}

#[test]
fn first_wake_scrubs_garbage_integral() {
    // Whatever bytes a half-initialized region decoded to, the first
    // wake of the device's lifetime must not trust the integral.
    let mut store = RtcStore::new();
    store.store(&RetainedState {
        boot_count: 0,
        pid_integral: 9999.0,
        first_boot: true,
    });

    let mut retained = store.load().unwrap();
    retained.on_wake();
    assert_eq!(retained.pid_integral, 0.0);
    assert!(!retained.first_boot);
}
