//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlCycle (domain)
//! ```
//!
//! Driven adapters (sensor, fan, collector link, retained memory, clock)
//! implement these traits.  The [`ControlCycle`](super::cycle::ControlCycle)
//! consumes them via generics, so the domain core never touches hardware
//! directly — and every test can substitute a scripted mock, including a
//! manual clock for time-free determinism.

use crate::error::{ReportError, SensorError};
use crate::retained::RetainedState;

use super::cycle::SensorReading;
use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// A point-in-time environmental sample, produced fresh each tick.
/// Never persisted; an invalid sample must not reach the controller.
#[derive(Debug, Clone, Copy)]
pub struct SensorSample {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub pressure_hpa: f32,
}

impl SensorSample {
    /// A sample is usable only if its temperature parsed to a real number.
    /// Humidity/pressure NaNs degrade the report but not the control loop.
    pub fn is_valid(&self) -> bool {
        !self.temperature_c.is_nan()
    }
}

/// Read-side port: the domain calls this once per control tick.
pub trait SensorPort {
    fn read_sample(&mut self) -> Result<SensorSample, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Fan port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain commands the fan through this.
pub trait FanPort {
    /// Set the fan duty cycle (0–100 %).
    fn set_duty_percent(&mut self, percent: u8);

    /// Fail-safe stop.  Called on every control-loop exit path.
    fn off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Report port (driven adapter: domain → collector)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget delivery of the final reading snapshot.  A failure is
/// logged by the caller and never retried within the same wake cycle —
/// the next wake is the retry.
pub trait ReportPort {
    fn send(&mut self, reading: &SensorReading) -> Result<(), ReportError>;
}

// ───────────────────────────────────────────────────────────────
// Retained store port (domain ↔ deep-sleep survivable memory)
// ───────────────────────────────────────────────────────────────

/// Access to the fixed-size record that survives the sleep/wake boundary.
///
/// Exactly one logical owner per wake cycle — the wake entry loads it
/// once, the pre-sleep path stores it once.  There are no concurrent
/// writers by construction.
pub trait RetainedStorePort {
    /// Load the retained record.  `None` after a full power loss (or the
    /// very first boot), when the region fails its validity check.
    fn load(&self) -> Option<RetainedState>;

    /// Overwrite the retained record in place.
    fn store(&mut self, state: &RetainedState);
}

// ───────────────────────────────────────────────────────────────
// Clock port (injectable time source)
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus the blocking inter-tick wait.
///
/// Injectable so the orchestrator and controller are testable without
/// real delays: a mock clock advances `now_ms` inside `sleep_ms`.
pub trait ClockPort {
    /// Milliseconds since boot (monotonic).
    fn now_ms(&self) -> u64;

    /// Block for `ms`.  The process owns the CPU exclusively, so this is
    /// a plain synchronous sleep, not a scheduled suspension.
    fn sleep_ms(&self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
/// Adapters decide where they go (serial log today; anything later).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
