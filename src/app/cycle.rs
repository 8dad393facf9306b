//! Control-loop orchestrator.
//!
//! Drives the sample → compute → actuate cycle for one wake period:
//!
//! ```text
//!            ┌──────────────────────────────┐
//!            │           Running            │
//!            └──────┬───────┬───────┬───────┘
//!     3 in-band     │       │       │   read failed
//!     samples ──────┘       │       └────────── SensorFailed
//!         Stabilized        │ deadline passed
//!                           └────────────────── TimedOut
//! ```
//!
//! All three terminal states drive the fan to 0 % before returning
//! control (fail-safe).  The orchestrator is advanced tick by tick with
//! an explicit `now` timestamp, so tests step it with a manual clock and
//! no real delays; [`ControlCycle::run`] adds the blocking pacing used
//! on the device.

use log::warn;
use serde::Serialize;

use crate::config::SystemConfig;
use crate::control::pid::{ControlAction, PidController};
use crate::error::Error;

use super::events::AppEvent;
use super::ports::{ClockPort, EventSink, FanPort, SensorPort, SensorSample};

// ---------------------------------------------------------------------------
// Terminal outcomes
// ---------------------------------------------------------------------------

/// How the control loop ended.  Decides whether a snapshot is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The measured temperature held within tolerance of the setpoint
    /// for the required number of consecutive samples.
    Stabilized,
    /// A sensor read failed mid-loop; iteration halted immediately.
    SensorFailure,
    /// The wall-clock budget expired before convergence.
    TimedOut,
}

// ---------------------------------------------------------------------------
// Final snapshot
// ---------------------------------------------------------------------------

/// The reading handed to the collector — one per wake cycle, built at
/// loop exit, immutable afterward.  Field names are the collector's wire
/// schema.
#[derive(Debug, Clone, Serialize)]
pub struct SensorReading {
    /// Correlation id: the retained boot counter.
    pub id: u32,
    pub temperature: f32,
    pub humidity: f32,
    pub pressure: f32,
    /// Fan duty at the last control tick (percent, 0–100).
    pub fan_speed: u8,
    pub setpoint: f64,
    /// Station RSSI in dBm at send time; 0 when unknown.
    pub rssi: i32,
}

/// Everything the wake-cycle entry needs after the loop exits.
#[derive(Debug, Clone)]
pub struct CycleResult {
    pub outcome: LoopOutcome,
    /// `None` when the loop exited via `SensorFailure` before a single
    /// valid sample was captured — nothing worth reporting.
    pub reading: Option<SensorReading>,
    /// Final integral term, written back to retained memory by the caller.
    pub pid_integral: f64,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// One wake cycle's control loop.
pub struct ControlCycle {
    pid: PidController,
    setpoint_c: f64,
    output_min: f64,
    output_max: f64,
    tolerance_c: f64,
    stable_required: u32,
    sample_period_ms: u32,
    max_run_ms: u64,

    deadline_ms: Option<u64>,
    consecutive_stable: u32,
    ticks: u32,

    // Running snapshot, refreshed on every valid tick.
    last_sample: Option<SensorSample>,
    last_fan_percent: u8,
    boot_count: u32,
}

impl ControlCycle {
    /// Build the orchestrator for this wake cycle, re-arming the
    /// controller with the integral persisted by the previous cycle.
    pub fn new(cfg: &SystemConfig, boot_count: u32, seed_integral: f64) -> Self {
        let ctl = cfg.controller;
        let mut pid = PidController::new(ctl, ControlAction::Reverse);
        pid.prime_integral(seed_integral);

        Self {
            pid,
            setpoint_c: ctl.setpoint_c,
            output_min: ctl.output_min,
            output_max: ctl.output_max,
            tolerance_c: cfg.stability_tolerance_c,
            stable_required: cfg.stable_samples_required,
            sample_period_ms: ctl.sample_period_ms,
            max_run_ms: u64::from(cfg.max_run_secs) * 1000,
            deadline_ms: None,
            consecutive_stable: 0,
            ticks: 0,
            last_sample: None,
            last_fan_percent: 0,
            boot_count,
        }
    }

    /// Arm the wall-clock deadline.  Must be called once before the
    /// first [`step`](Self::step).
    pub fn start(&mut self, now_ms: u64) {
        self.deadline_ms = Some(now_ms + self.max_run_ms);
    }

    /// Advance the loop by one tick at monotonic time `now_ms`.
    ///
    /// Returns `Some(outcome)` when a terminal state was reached; the fan
    /// has already been driven to 0 % by then.
    pub fn step(
        &mut self,
        hw: &mut (impl SensorPort + FanPort),
        sink: &mut impl EventSink,
        now_ms: u64,
    ) -> Option<LoopOutcome> {
        let deadline = self
            .deadline_ms
            .expect("ControlCycle::start must run before step");
        self.ticks += 1;

        // 1. Sample.  A failed or NaN read aborts the cycle immediately —
        //    no recovery mid-cycle, no further actuation with stale data.
        let sample = match hw.read_sample() {
            Ok(s) if s.is_valid() => s,
            Ok(_) => {
                warn!("sensor returned NaN temperature, aborting loop");
                return Some(self.finish(hw, sink, LoopOutcome::SensorFailure));
            }
            Err(e) => {
                warn!("{}; aborting loop", Error::SensorRead(e));
                return Some(self.finish(hw, sink, LoopOutcome::SensorFailure));
            }
        };

        // 2. Compute the clamped actuator command.
        let measured = f64::from(sample.temperature_c);
        let out = self.pid.compute(measured, now_ms);

        // 3. Actuate.
        let percent = self.command_to_percent(out.command);
        hw.set_duty_percent(percent);

        // 4. Record into the running snapshot.
        self.last_sample = Some(sample);
        self.last_fan_percent = percent;

        sink.emit(&AppEvent::Tick {
            temperature_c: sample.temperature_c,
            fan_percent: percent,
            error_c: out.error,
        });

        // 5. Convergence detection.
        if (measured - self.setpoint_c).abs() < self.tolerance_c {
            self.consecutive_stable += 1;
            if self.consecutive_stable >= self.stable_required {
                return Some(self.finish(hw, sink, LoopOutcome::Stabilized));
            }
        } else {
            self.consecutive_stable = 0;
        }

        // 6. Wall-clock budget.
        if now_ms >= deadline {
            return Some(self.finish(hw, sink, LoopOutcome::TimedOut));
        }

        None
    }

    /// Run the loop to completion with real pacing: one tick per sample
    /// period, blocking in between (the process owns the CPU for the
    /// whole wake).
    pub fn run(
        &mut self,
        hw: &mut (impl SensorPort + FanPort),
        sink: &mut impl EventSink,
        clock: &impl ClockPort,
    ) -> CycleResult {
        self.start(clock.now_ms());
        let outcome = loop {
            if let Some(outcome) = self.step(hw, sink, clock.now_ms()) {
                break outcome;
            }
            clock.sleep_ms(self.sample_period_ms);
        };
        self.result(outcome)
    }

    /// Package the terminal state for the wake-cycle entry.
    pub fn result(&self, outcome: LoopOutcome) -> CycleResult {
        let reading = self.last_sample.map(|s| SensorReading {
            id: self.boot_count,
            temperature: s.temperature_c,
            humidity: s.humidity_pct,
            pressure: s.pressure_hpa,
            fan_speed: self.last_fan_percent,
            setpoint: self.setpoint_c,
            rssi: 0,
        });
        CycleResult {
            outcome,
            reading,
            pid_integral: self.pid.integral(),
        }
    }

    /// Ticks executed so far (diagnostics).
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// Exit actions shared by every terminal state: fan off, announce.
    fn finish(
        &mut self,
        hw: &mut impl FanPort,
        sink: &mut impl EventSink,
        outcome: LoopOutcome,
    ) -> LoopOutcome {
        hw.off();
        sink.emit(&AppEvent::Outcome(outcome));
        outcome
    }

    /// Linear map from the raw command range to a duty-cycle percent.
    fn command_to_percent(&self, command: f64) -> u8 {
        let span = self.output_max - self.output_min;
        let scaled = (command - self.output_min) / span * 100.0;
        scaled.round().clamp(0.0, 100.0) as u8
    }
}
