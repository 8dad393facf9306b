//! System configuration parameters
//!
//! All tunable parameters for the fanstat node.  Both structs are built
//! once at boot and never mutated afterwards — the controller and the
//! orchestrator take them by value and keep no access to any shared
//! mutable configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Closed-loop controller configuration.
///
/// Immutable for the process lifetime; handed to
/// [`PidController::new`](crate::control::pid::PidController::new).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Target temperature (°C).
    pub setpoint_c: f64,
    /// Proportional gain.
    pub kp: f64,
    /// Integral gain.
    pub ki: f64,
    /// Derivative gain.
    pub kd: f64,
    /// Lower output bound (raw actuator command).
    pub output_min: f64,
    /// Upper output bound (raw actuator command).
    pub output_max: f64,
    /// Minimum time between PID recomputations (milliseconds).
    pub sample_period_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            setpoint_c: 24.0,
            kp: 10.0,
            ki: 0.1,
            kd: 1.0,
            output_min: 0.0,
            output_max: 255.0,
            sample_period_ms: 5_000,
        }
    }
}

/// Core system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Controller gains, setpoint, bounds and sample period.
    pub controller: ControllerConfig,

    // --- Convergence detection ---
    /// |measured − setpoint| below this counts as a stable sample (°C).
    pub stability_tolerance_c: f64,
    /// Consecutive stable samples required to declare convergence.
    pub stable_samples_required: u32,

    // --- Timing ---
    /// Hard wall-clock budget for one control loop (seconds).
    pub max_run_secs: u32,
    /// Deep-sleep duration between wake cycles (seconds).
    pub sleep_secs: u32,

    // --- Network ---
    /// Wi-Fi association attempts before giving up for this cycle.
    pub wifi_max_attempts: u32,
    /// Delay between association attempts (milliseconds).
    pub wifi_attempt_delay_ms: u32,
    /// Collector hostname or IP.
    pub collector_host: heapless::String<64>,
    /// Collector TCP port.
    pub collector_port: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut collector_host = heapless::String::new();
        // 64-byte capacity always fits the default address.
        let _ = collector_host.push_str("192.168.1.2");
        Self {
            controller: ControllerConfig::default(),

            // Convergence
            stability_tolerance_c: 0.5,
            stable_samples_required: 3,

            // Timing
            max_run_secs: 300, // 5 min control budget
            sleep_secs: 300,   // 5 min between wakes

            // Network
            wifi_max_attempts: 15,
            wifi_attempt_delay_ms: 1_000,
            collector_host,
            collector_port: 8888,
        }
    }
}

/// Range-check a configuration before use.
///
/// Invalid values are rejected, not silently clamped — a bad build-time
/// constant should fail loudly on the first boot, not misbehave quietly.
pub fn validate_config(cfg: &SystemConfig) -> Result<()> {
    let c = &cfg.controller;
    if !(-40.0..=85.0).contains(&c.setpoint_c) {
        return Err(Error::Config("setpoint_c must be -40.0–85.0"));
    }
    if c.kp < 0.0 || c.ki < 0.0 || c.kd < 0.0 {
        return Err(Error::Config("gains must be non-negative"));
    }
    if c.output_min >= c.output_max {
        return Err(Error::Config("output_min must be < output_max"));
    }
    if !(100..=60_000).contains(&c.sample_period_ms) {
        return Err(Error::Config("sample_period_ms must be 100–60000"));
    }
    if !(0.05..=5.0).contains(&cfg.stability_tolerance_c) {
        return Err(Error::Config("stability_tolerance_c must be 0.05–5.0"));
    }
    if cfg.stable_samples_required == 0 {
        return Err(Error::Config("stable_samples_required must be >= 1"));
    }
    if !(10..=3_600).contains(&cfg.max_run_secs) {
        return Err(Error::Config("max_run_secs must be 10–3600"));
    }
    if cfg.sleep_secs == 0 {
        return Err(Error::Config("sleep_secs must be >= 1"));
    }
    if cfg.wifi_max_attempts == 0 {
        return Err(Error::Config("wifi_max_attempts must be >= 1"));
    }
    if cfg.collector_port == 0 {
        return Err(Error::Config("collector_port must be non-zero"));
    }
    Ok(())
}
