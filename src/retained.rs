//! The retained-memory record and its wake lifecycle.
//!
//! Deep sleep destroys normal process memory; a few dozen bytes of RTC
//! slow memory survive.  Everything that must outlive a sleep/wake
//! boundary lives in this one fixed record, explicitly serialized to and
//! restored from the [`RetainedStorePort`](crate::app::ports::RetainedStorePort)
//! at cycle start and end — never as ordinary global state.
//!
//! A full power loss invalidates the region; the store then reports no
//! record and the node behaves as a first boot.

use serde::{Deserialize, Serialize};

/// The record that survives the deep-sleep boundary.
///
/// Mutated exactly once per wake cycle: [`on_wake`](Self::on_wake) at
/// entry, the integral write-back just before sleep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetainedState {
    /// Monotonic wake counter; doubles as the reading correlation id.
    pub boot_count: u32,
    /// The controller's accumulated integral term, carried across sleep
    /// so control resumes with continuity instead of re-learning the
    /// offset every five minutes.
    pub pid_integral: f64,
    /// Set until the first wake of the device's lifetime has run.
    /// Distinguishes a true cold start (stale integral must be zeroed)
    /// from a warm wake (integral is a meaningful estimate).
    pub first_boot: bool,
}

impl Default for RetainedState {
    fn default() -> Self {
        Self {
            boot_count: 0,
            pid_integral: 0.0,
            first_boot: true,
        }
    }
}

impl RetainedState {
    /// Apply the wake-entry lifecycle: count the boot unconditionally,
    /// and zero the integral exactly once in the device's lifetime.
    pub fn on_wake(&mut self) {
        self.boot_count = self.boot_count.wrapping_add(1);
        if self.first_boot {
            self.pid_integral = 0.0;
            self.first_boot = false;
        }
    }
}
