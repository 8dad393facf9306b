//! Fanstat firmware — main entry point.
//!
//! One wake cycle from cold silicon to deep sleep:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  wake ─▶ retained load ─▶ hw init ─▶ wifi (best effort)  │
//! │                │                                         │
//! │                ▼                                         │
//! │        ControlCycle::run (PID ticks until stable/        │
//! │        sensor failure/time budget; fan off on exit)      │
//! │                │                                         │
//! │                ▼                                         │
//! │  report snapshot ─▶ retained store ─▶ deep sleep (5 min) │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every path out of `main` ends in deep sleep — a node that crashes
//! awake drains its battery in hours.

#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod config;
pub mod error;
mod pins;
mod power;
mod retained;

pub mod app;
mod adapters;
mod drivers;
mod sensors;
mod control;

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{error, info, warn};

use adapters::hardware::HardwareAdapter;
use adapters::log_sink::LogSink;
use adapters::reporter::TcpReporter;
use adapters::rtc_store::RtcStore;
use adapters::time::SystemClock;
use adapters::wifi::WifiAdapter;
use app::cycle::ControlCycle;
use app::events::AppEvent;
use app::ports::{EventSink, ReportPort, RetainedStorePort};
use config::SystemConfig;

// Station credentials are baked in at build time; an empty SSID makes
// every cycle run unreported, which is still a functioning thermostat.
const WIFI_SSID: &str = match option_env!("FANSTAT_WIFI_SSID") {
    Some(s) => s,
    None => "",
};
const WIFI_PASSWORD: &str = match option_env!("FANSTAT_WIFI_PASSWORD") {
    Some(s) => s,
    None => "",
};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("fanstat v{} starting", env!("CARGO_PKG_VERSION"));
    info!("wake cause: {}", power::wake_reason().as_str());

    let config = SystemConfig::default();
    if let Err(e) = config::validate_config(&config) {
        // Compiled-in defaults failing validation is a build defect, but
        // the battery must still be protected: sleep, don't spin.
        error!("invalid configuration: {e}");
        power::enter_deep_sleep(config.sleep_secs);
    }

    // ── 2. Retained state (survives deep sleep, not power loss) ─
    let mut store = RtcStore::new();
    let mut retained = store.load().unwrap_or_else(|| {
        info!("no retained record, cold start");
        retained::RetainedState::default()
    });
    let cold_boot = retained.first_boot;
    retained.on_wake();

    let mut sink = LogSink;
    sink.emit(&AppEvent::CycleStarted {
        boot_count: retained.boot_count,
        first_boot: cold_boot,
    });

    // ── 3. Hardware bring-up ──────────────────────────────────
    let mut hw = match HardwareAdapter::init() {
        Ok(hw) => hw,
        Err(e) => {
            // No sensor means nothing to control: skip straight to sleep
            // and let the next wake retry from scratch.
            error!("hardware init failed: {e}");
            store.store(&retained);
            sink.emit(&AppEvent::EnteringSleep {
                secs: config.sleep_secs,
            });
            power::enter_deep_sleep(config.sleep_secs);
        }
    };

    // ── 4. Wi-Fi (best effort — control never waits on it) ────
    let peripherals = esp_idf_svc::hal::peripherals::Peripherals::take()?;
    let sysloop = esp_idf_svc::eventloop::EspSystemEventLoop::take()?;
    let nvs = esp_idf_svc::nvs::EspDefaultNvsPartition::take()?;

    let mut wifi = match WifiAdapter::new(peripherals.modem, sysloop, nvs) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!(
                "wifi driver unavailable ({}); cycle runs unreported",
                error::Error::from(e)
            );
            None
        }
    };
    if let Some(w) = wifi.as_mut() {
        if let Err(e) = w.connect(
            WIFI_SSID,
            WIFI_PASSWORD,
            config.wifi_max_attempts,
            config.wifi_attempt_delay_ms,
        ) {
            warn!(
                "wifi association failed ({}); cycle runs unreported",
                error::Error::from(e)
            );
        }
    }

    // ── 5. Control loop ───────────────────────────────────────
    let clock = SystemClock::new();
    let mut cycle = ControlCycle::new(&config, retained.boot_count, retained.pid_integral);
    let result = cycle.run(&mut hw, &mut sink, &clock);
    info!(
        "cycle finished after {} ticks: {:?}",
        cycle.ticks(),
        result.outcome
    );

    // ── 6. Report the final snapshot ──────────────────────────
    match (result.reading, wifi.as_ref().map(WifiAdapter::is_connected)) {
        (Some(mut reading), Some(true)) => {
            reading.rssi = wifi
                .as_ref()
                .and_then(WifiAdapter::rssi)
                .map_or(0, i32::from);
            let mut reporter = TcpReporter::new(&config);
            match reporter.send(&reading) {
                Ok(()) => sink.emit(&AppEvent::ReportSent { id: reading.id }),
                Err(e) => sink.emit(&AppEvent::ReportFailed(e.into())),
            }
        }
        (Some(_), _) => info!("no uplink; snapshot not reported"),
        (None, _) => info!("no valid sample this cycle; nothing to report"),
    }

    // ── 7. Persist + power down ───────────────────────────────
    retained.pid_integral = result.pid_integral;
    store.store(&retained);

    if let Some(w) = wifi.as_mut() {
        w.disconnect();
    }
    hw.shutdown();

    sink.emit(&AppEvent::EnteringSleep {
        secs: config.sleep_secs,
    });
    power::enter_deep_sleep(config.sleep_secs);
}
