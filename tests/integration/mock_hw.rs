//! Mock adapters for integration tests.
//!
//! Records every fan command so tests can assert on the full actuation
//! history, feeds scripted sensor readings, and drives time manually so
//! a 300-second run window elapses in microseconds of test wall time.

use std::cell::Cell;
use std::collections::VecDeque;

use fanstat::app::events::AppEvent;
use fanstat::app::ports::{ClockPort, EventSink, FanPort, SensorPort, SensorSample};
use fanstat::error::SensorError;

// ── Fan call record ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanCall {
    Duty(u8),
    Off,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    script: VecDeque<Result<SensorSample, SensorError>>,
    /// When the script runs dry, keep replaying the last good sample.
    hold: Option<SensorSample>,
    pub fan_calls: Vec<FanCall>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            hold: None,
            fan_calls: Vec::new(),
        }
    }

    pub fn sample(temperature_c: f32) -> SensorSample {
        SensorSample {
            temperature_c,
            humidity_pct: 40.0,
            pressure_hpa: 1013.0,
        }
    }

    pub fn push_temp(&mut self, temperature_c: f32) {
        self.script.push_back(Ok(Self::sample(temperature_c)));
    }

    pub fn push_temps(&mut self, temps: &[f32]) {
        for &t in temps {
            self.push_temp(t);
        }
    }

    pub fn push_failure(&mut self) {
        self.script.push_back(Err(SensorError::BusError));
    }

    /// Duty-cycle percents actually commanded, in order (Off records as 0).
    pub fn duty_history(&self) -> Vec<u8> {
        self.fan_calls
            .iter()
            .map(|c| match c {
                FanCall::Duty(d) => *d,
                FanCall::Off => 0,
            })
            .collect()
    }

    pub fn last_call(&self) -> Option<FanCall> {
        self.fan_calls.last().copied()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_sample(&mut self) -> Result<SensorSample, SensorError> {
        match self.script.pop_front() {
            Some(Ok(s)) => {
                self.hold = Some(s);
                Ok(s)
            }
            Some(Err(e)) => Err(e),
            None => self.hold.ok_or(SensorError::NotReady),
        }
    }
}

impl FanPort for MockHardware {
    fn set_duty_percent(&mut self, percent: u8) {
        self.fan_calls.push(FanCall::Duty(percent));
    }

    fn off(&mut self) {
        self.fan_calls.push(FanCall::Off);
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// Deterministic clock: `sleep_ms` advances `now_ms` instantly.
pub struct ManualClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self { now: Cell::new(0) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::Tick { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
