//! Control-loop integration tests: scripted room temperatures in, full
//! actuation and event history out.
//!
//! Gains and thresholds come from `SystemConfig::default()` (Kp=10,
//! Ki=0.1, Kd=1, 5 s period, ±0.5 °C stability band, 3 samples, 300 s
//! run window).

use fanstat::app::cycle::{ControlCycle, LoopOutcome};
use fanstat::app::events::AppEvent;
use fanstat::config::SystemConfig;

use crate::mock_hw::{FanCall, ManualClock, MockHardware, RecordingSink};

fn run_cycle(
    temps: &[f32],
    boot_count: u32,
    seed_integral: f64,
) -> (fanstat::app::cycle::CycleResult, MockHardware, RecordingSink) {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    hw.push_temps(temps);
    let mut sink = RecordingSink::new();
    let clock = ManualClock::new();

    let mut cycle = ControlCycle::new(&cfg, boot_count, seed_integral);
    let result = cycle.run(&mut hw, &mut sink, &clock);
    (result, hw, sink)
}

#[test]
fn hot_room_converges_and_stabilizes() {
    // A 30 °C room cooling toward the 24 °C setpoint: fan drive must
    // fall monotonically as the error shrinks, and three consecutive
    // in-band samples end the loop.
    let (result, hw, sink) = run_cycle(&[30.0, 27.0, 25.0, 24.3, 24.1, 24.0], 1, 0.0);

    assert_eq!(result.outcome, LoopOutcome::Stabilized);
    assert_eq!(sink.tick_count(), 6);

    // Six duty commands, then the terminal off().
    let duties = hw.duty_history();
    assert_eq!(duties.len(), 7);
    assert_eq!(hw.last_call(), Some(FanCall::Off));

    let drive = &duties[..6];
    assert_eq!(drive, &[25, 13, 6, 3, 2, 2]);
    assert!(
        drive.windows(2).all(|w| w[1] <= w[0]),
        "fan drive must not rise while the room cools: {drive:?}"
    );

    // The final snapshot is the last valid tick.
    let reading = result.reading.expect("stabilized run must carry a snapshot");
    assert_eq!(reading.temperature, 24.0);
    assert_eq!(reading.fan_speed, 2);

    // 6·5 s of shrinking error accumulates to exactly 52 error-seconds.
    assert!((result.pid_integral - 52.0).abs() < 1e-9);
}

#[test]
fn out_of_band_sample_resets_stability_count() {
    // Two in-band samples, a 26 °C excursion, then three more in-band:
    // the excursion must restart the count, so the loop ends on tick 6.
    let (result, _hw, sink) = run_cycle(&[24.1, 24.2, 26.0, 24.1, 24.0, 24.2], 1, 0.0);
    assert_eq!(result.outcome, LoopOutcome::Stabilized);
    assert_eq!(sink.tick_count(), 6);
}

#[test]
fn boundary_error_never_counts_as_stable() {
    // Exactly 0.5 °C of error sits on the band edge, which is exclusive:
    // the loop must run out its 300 s window instead of stabilizing.
    let (result, hw, sink) = run_cycle(&[24.5], 1, 0.0);
    assert_eq!(result.outcome, LoopOutcome::TimedOut);
    // Ticks at t = 0, 5 s, …, 300 s inclusive.
    assert_eq!(sink.tick_count(), 61);
    assert_eq!(hw.last_call(), Some(FanCall::Off));
}

#[test]
fn sensor_failure_aborts_with_fan_off_and_partial_snapshot() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    hw.push_temp(30.0);
    hw.push_temp(27.0);
    hw.push_failure();
    let mut sink = RecordingSink::new();
    let clock = ManualClock::new();

    let mut cycle = ControlCycle::new(&cfg, 5, 0.0);
    let result = cycle.run(&mut hw, &mut sink, &clock);

    assert_eq!(result.outcome, LoopOutcome::SensorFailure);
    assert_eq!(sink.tick_count(), 2);
    assert_eq!(hw.last_call(), Some(FanCall::Off));

    // The snapshot freezes at the last valid tick, not the failure.
    let reading = result.reading.expect("two valid ticks ran before the fault");
    assert_eq!(reading.temperature, 27.0);
    assert_eq!(reading.fan_speed, 13);
}

#[test]
fn failure_on_first_tick_leaves_nothing_to_report() {
    let cfg = SystemConfig::default();
    let mut hw = MockHardware::new();
    hw.push_failure();
    let mut sink = RecordingSink::new();
    let clock = ManualClock::new();

    let mut cycle = ControlCycle::new(&cfg, 1, 0.0);
    let result = cycle.run(&mut hw, &mut sink, &clock);

    assert_eq!(result.outcome, LoopOutcome::SensorFailure);
    assert!(result.reading.is_none());
    // Fail-safe still runs even though the fan was never driven.
    assert_eq!(hw.last_call(), Some(FanCall::Off));
}

#[test]
fn reading_carries_boot_count_and_setpoint() {
    let (result, _hw, _sink) = run_cycle(&[24.0, 24.0, 24.0], 42, 0.0);
    let reading = result.reading.unwrap();
    assert_eq!(reading.id, 42);
    assert_eq!(reading.setpoint, 24.0);
    assert_eq!(reading.rssi, 0, "rssi is filled in by the reporting path");
}

#[test]
fn terminal_outcome_is_announced_last() {
    let (_result, _hw, sink) = run_cycle(&[24.0, 24.0, 24.0], 1, 0.0);
    assert!(matches!(
        sink.events.last(),
        Some(AppEvent::Outcome(LoopOutcome::Stabilized))
    ));
}

#[test]
fn seeded_integral_raises_initial_drive() {
    // A warm wake carries yesterday's integral: with the same first
    // sample, the seeded controller must command more fan than a cold
    // one.
    let (cold, _, _) = run_cycle(&[30.0], 1, 0.0);
    let (seeded, _, _) = run_cycle(&[30.0], 2, 500.0);
    // Both time out (constant 30 °C), but the seeded run accumulated
    // from a higher starting point.
    assert!(seeded.pid_integral > cold.pid_integral);
}
