//! Outbound application events.
//!
//! The [`ControlCycle`](super::cycle::ControlCycle) and the wake-cycle
//! entry emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them — today
//! that is the serial log; a future MQTT sink would implement the same
//! trait.

use crate::error::Error;

use super::cycle::LoopOutcome;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A wake cycle has begun (carries the incremented boot counter).
    CycleStarted { boot_count: u32, first_boot: bool },

    /// One control tick completed against a valid sample.
    Tick {
        temperature_c: f32,
        fan_percent: u8,
        error_c: f64,
    },

    /// The control loop reached a terminal state.
    Outcome(LoopOutcome),

    /// The reading snapshot was delivered to the collector.
    ReportSent { id: u32 },

    /// Delivery failed; the next wake cycle is the retry.
    ReportFailed(Error),

    /// The node is about to enter deep sleep.
    EnteringSleep { secs: u32 },
}
