//! Property tests for the control core.
//!
//! Runs on host (x86_64) only — proptest is not available for ESP32
//! targets.  On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use fanstat::app::cycle::ControlCycle;
use fanstat::app::events::AppEvent;
use fanstat::app::ports::{EventSink, FanPort, SensorPort, SensorSample};
use fanstat::config::SystemConfig;
use fanstat::control::pid::{ControlAction, PidController};
use fanstat::error::SensorError;
use fanstat::retained::RetainedState;
use proptest::prelude::*;

// ── PID safety envelope ───────────────────────────────────────

proptest! {
    /// No measurement sequence, however absurd, may drive the command
    /// outside the configured actuator range.
    #[test]
    fn pid_command_always_within_output_range(
        temps in proptest::collection::vec(-100.0f64..200.0, 1..80),
    ) {
        let cfg = SystemConfig::default().controller;
        let mut pid = PidController::new(cfg, ControlAction::Reverse);
        let mut now = 0u64;
        for t in temps {
            now += u64::from(cfg.sample_period_ms);
            let out = pid.compute(t, now);
            prop_assert!(out.command >= cfg.output_min);
            prop_assert!(out.command <= cfg.output_max);
        }
    }

    /// The integral accumulator stays inside the anti-windup clamp no
    /// matter how long the loop saturates in either direction.
    #[test]
    fn pid_integral_stays_bounded(
        temps in proptest::collection::vec(-100.0f64..200.0, 1..200),
        seed in -1e6f64..1e6,
    ) {
        let cfg = SystemConfig::default().controller;
        let mut pid = PidController::new(cfg, ControlAction::Reverse);
        pid.prime_integral(seed);
        let mut now = 0u64;
        for t in temps {
            now += u64::from(cfg.sample_period_ms);
            pid.compute(t, now);
            prop_assert!(pid.integral() >= cfg.output_min / cfg.ki - 1e-9);
            prop_assert!(pid.integral() <= cfg.output_max / cfg.ki + 1e-9);
        }
    }
}

// ── Control-loop termination ──────────────────────────────────

struct ScriptedHw {
    temps: Vec<f32>,
    i: usize,
    off_seen: bool,
}

impl SensorPort for ScriptedHw {
    fn read_sample(&mut self) -> Result<SensorSample, SensorError> {
        let t = self.temps[self.i.min(self.temps.len() - 1)];
        self.i += 1;
        Ok(SensorSample {
            temperature_c: t,
            humidity_pct: 40.0,
            pressure_hpa: 1013.0,
        })
    }
}

impl FanPort for ScriptedHw {
    fn set_duty_percent(&mut self, _percent: u8) {}
    fn off(&mut self) {
        self.off_seen = true;
    }
}

struct NullSink;
impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

proptest! {
    /// Every temperature trajectory terminates within the run window
    /// (at most 61 ticks of 5 s under a 300 s budget) and ends with the
    /// fan off.
    #[test]
    fn control_loop_always_terminates_with_fan_off(
        temps in proptest::collection::vec(-40.0f32..85.0, 1..70),
    ) {
        let cfg = SystemConfig::default();
        let mut hw = ScriptedHw { temps, i: 0, off_seen: false };
        let mut sink = NullSink;
        let mut cycle = ControlCycle::new(&cfg, 1, 0.0);

        cycle.start(0);
        let mut now = 0u64;
        let mut outcome = None;
        for _ in 0..=61 {
            outcome = cycle.step(&mut hw, &mut sink, now);
            if outcome.is_some() {
                break;
            }
            now += u64::from(cfg.controller.sample_period_ms);
        }
        prop_assert!(outcome.is_some(), "loop exceeded its tick budget");
        prop_assert!(hw.off_seen, "terminal state must stop the fan");
    }
}

// ── Retained record round-trip ────────────────────────────────

proptest! {
    /// Any finite integral survives the postcard encode/decode the RTC
    /// slot performs, bit-for-bit.
    #[test]
    fn retained_state_round_trips_bit_exact(
        boot_count in any::<u32>(),
        integral in -1e9f64..1e9,
        first_boot in any::<bool>(),
    ) {
        let state = RetainedState { boot_count, pid_integral: integral, first_boot };
        let bytes = postcard::to_allocvec(&state).unwrap();
        let back: RetainedState = postcard::from_bytes(&bytes).unwrap();
        prop_assert_eq!(back.boot_count, boot_count);
        prop_assert_eq!(back.pid_integral.to_bits(), integral.to_bits());
        prop_assert_eq!(back.first_boot, first_boot);
    }
}
