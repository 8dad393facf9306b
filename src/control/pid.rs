//! PID controller for fan-speed regulation.
//!
//! Timestamp-driven proportional-integral-derivative controller.  The
//! integral is accumulated as error × elapsed-seconds rather than per
//! fixed tick, so the algorithm stays correct under variable sample
//! spacing — the first tick after a deep-sleep wake rarely lands exactly
//! one nominal period after the previous cycle's last tick.
//!
//! The derivative acts on the measurement, not the error, so a setpoint
//! change cannot produce a derivative kick.
//!
//! The accumulated integral survives deep sleep: it is seeded from the
//! retained-memory record via [`PidController::prime_integral`] and read
//! back through [`PidController::integral`] before the node sleeps.

use crate::config::ControllerConfig;

/// Controller action direction.
///
/// A fan cooling a space is a reverse-acting loop: the actuator command
/// must grow as the measurement rises *above* the setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Output grows with (setpoint − measured). Heaters, humidifiers.
    Direct,
    /// Output grows with (measured − setpoint). Fans, chillers.
    Reverse,
}

/// One `compute` result: the clamped actuator command plus the values
/// worth logging alongside it.
#[derive(Debug, Clone, Copy)]
pub struct ControlOutput {
    /// Clamped actuator command in `[output_min, output_max]`.
    pub command: f64,
    /// Raw control error (setpoint − measured) at this sample.
    pub error: f64,
    /// Accumulated integral after this sample (bounded, see anti-windup).
    pub integral: f64,
}

/// PID controller.
pub struct PidController {
    cfg: ControllerConfig,
    action: ControlAction,
    integral: f64,
    last_input: Option<f64>,
    last_output: f64,
    last_sample_ms: Option<u64>,
}

impl PidController {
    pub fn new(cfg: ControllerConfig, action: ControlAction) -> Self {
        Self {
            cfg,
            action,
            integral: 0.0,
            last_input: None,
            last_output: cfg.output_min,
            last_sample_ms: None,
        }
    }

    /// Seed the integral accumulator from a previous wake cycle.
    ///
    /// The value is clamped to the same bounds `compute` enforces, so a
    /// corrupt or stale retained record cannot wind the controller up.
    pub fn prime_integral(&mut self, integral: f64) {
        self.integral = self.clamp_integral(integral);
    }

    /// Current integral accumulator (written back to retained memory
    /// before sleep).
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Compute the actuator command for `measured` at monotonic time
    /// `now_ms`.
    ///
    /// Caller contract: `measured` must be a valid (non-NaN) sample.
    /// Invalid samples are filtered by the orchestrator before this is
    /// called; feeding one in here is a bug, not a runtime condition.
    ///
    /// If less than the configured sample period has elapsed since the
    /// previous accepted sample, the previous output is returned
    /// unchanged and no state is updated.
    pub fn compute(&mut self, measured: f64, now_ms: u64) -> ControlOutput {
        debug_assert!(!measured.is_nan(), "PID fed a NaN measurement");

        let error = self.cfg.setpoint_c - measured;

        // Rate limiting: hold the previous output inside one sample period.
        let dt_secs = match self.last_sample_ms {
            Some(last) => {
                let elapsed_ms = now_ms.saturating_sub(last);
                if elapsed_ms < u64::from(self.cfg.sample_period_ms) {
                    return ControlOutput {
                        command: self.last_output,
                        error,
                        integral: self.integral,
                    };
                }
                elapsed_ms as f64 / 1000.0
            }
            // First sample of this wake: no previous timestamp, assume one
            // nominal period.
            None => f64::from(self.cfg.sample_period_ms) / 1000.0,
        };

        // Fold the action direction into the working error so the P/I/D
        // arithmetic below is direction-agnostic.
        let e = match self.action {
            ControlAction::Direct => error,
            ControlAction::Reverse => -error,
        };

        let p = self.cfg.kp * e;

        let accumulated = e * dt_secs;
        self.integral += accumulated;
        let i = self.cfg.ki * self.integral;

        // Derivative on measurement: immune to setpoint steps.
        let d = match self.last_input {
            Some(last) if dt_secs > 0.0 => {
                let d_meas = (measured - last) / dt_secs;
                match self.action {
                    ControlAction::Direct => -self.cfg.kd * d_meas,
                    ControlAction::Reverse => self.cfg.kd * d_meas,
                }
            }
            _ => 0.0,
        };

        let raw = p + i + d;
        let command = raw.clamp(self.cfg.output_min, self.cfg.output_max);

        // Anti-windup, two layers:
        // 1. Conditional integration — if the raw output is saturated and
        //    this sample's error pushes further into saturation, revert
        //    this sample's accumulation.
        if (raw > self.cfg.output_max && e > 0.0) || (raw < self.cfg.output_min && e < 0.0) {
            self.integral -= accumulated;
        }
        // 2. Hard clamp — the integral contribution alone may never exceed
        //    the output span.
        self.integral = self.clamp_integral(self.integral);

        self.last_input = Some(measured);
        self.last_output = command;
        self.last_sample_ms = Some(now_ms);

        ControlOutput {
            command,
            error,
            integral: self.integral,
        }
    }

    fn clamp_integral(&self, integral: f64) -> f64 {
        if self.cfg.ki > 0.0 {
            integral.clamp(
                self.cfg.output_min / self.cfg.ki,
                self.cfg.output_max / self.cfg.ki,
            )
        } else {
            integral
        }
    }
}
