//! Unified error types for the fanstat firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! wake-cycle code's error handling uniform.  All variants are `Copy` so
//! they can be cheaply threaded through the orchestrator without
//! allocation.
//!
//! Nothing here is retried within a single wake cycle: the deep-sleep /
//! wake periodicity is the retry mechanism at the system level.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The sensor never came up — fatal for the cycle, go straight to sleep.
    SensorInit(SensorError),
    /// A per-tick sensor read failed — aborts the control loop early.
    SensorRead(SensorError),
    /// Wi-Fi association failed — control still runs, reporting is skipped.
    Network(NetworkError),
    /// The collector could not be reached or rejected the payload.
    Report(ReportError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorInit(e) => write!(f, "sensor init: {e}"),
            Self::SensorRead(e) => write!(f, "sensor read: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Report(e) => write!(f, "report: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The chip did not answer on the I²C bus.
    BusError,
    /// The chip-id register returned an unexpected value.
    BadChipId,
    /// A measurement came back NaN or outside the physically plausible range.
    InvalidReading,
    /// The sensor has not finished its first conversion yet.
    NotReady,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusError => write!(f, "I2C bus error"),
            Self::BadChipId => write!(f, "unexpected chip id"),
            Self::InvalidReading => write!(f, "invalid reading"),
            Self::NotReady => write!(f, "sensor not ready"),
        }
    }
}

// ---------------------------------------------------------------------------
// Network errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// No credentials configured.
    NoCredentials,
    /// SSID failed validation (1–32 printable ASCII bytes).
    InvalidSsid,
    /// Password failed validation (8–64 bytes for WPA2, or empty for open).
    InvalidPassword,
    /// The Wi-Fi driver failed to initialise or start.
    Driver,
    /// The attempt budget was exhausted without associating.
    AssociationTimeout,
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid"),
            Self::InvalidPassword => write!(f, "password invalid"),
            Self::Driver => write!(f, "WiFi driver failure"),
            Self::AssociationTimeout => write!(f, "association attempts exhausted"),
        }
    }
}

// ---------------------------------------------------------------------------
// Report delivery errors
// ---------------------------------------------------------------------------

/// Delivery is fire-and-forget: these are logged once and never retried
/// within the same wake cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportError {
    /// TCP connect to the collector failed or timed out.
    ConnectFailed,
    /// The payload could not be written in full.
    WriteFailed,
    /// The snapshot failed to serialize.
    EncodeFailed,
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "collector connect failed"),
            Self::WriteFailed => write!(f, "payload write failed"),
            Self::EncodeFailed => write!(f, "payload encode failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<NetworkError> for Error {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

impl From<ReportError> for Error {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
