//! Event sink adapter: renders [`AppEvent`]s to the structured log.
//!
//! On target this lands on the serial console via the ESP-IDF logger; on
//! the host it goes through whatever `log` backend the test harness has
//! installed (usually none, which is fine — emission must never block or
//! fail).

use log::{info, warn};

use crate::app::cycle::LoopOutcome;
use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::CycleStarted {
                boot_count,
                first_boot,
            } => {
                info!(
                    "cycle start: boot #{}{}",
                    boot_count,
                    if *first_boot { " (cold boot)" } else { "" }
                );
            }
            AppEvent::Tick {
                temperature_c,
                fan_percent,
                error_c,
            } => {
                info!(
                    "tick: temp={:.2}C err={:+.2}C fan={}%",
                    temperature_c, error_c, fan_percent
                );
            }
            AppEvent::Outcome(outcome) => match outcome {
                LoopOutcome::Stabilized => info!("loop done: stabilized at setpoint"),
                LoopOutcome::TimedOut => warn!("loop done: run window expired before stability"),
                LoopOutcome::SensorFailure => warn!("loop done: sensor failure, fan off"),
            },
            AppEvent::ReportSent { id } => {
                info!("report #{} delivered", id);
            }
            AppEvent::ReportFailed(e) => {
                warn!("report not delivered: {} (next wake retries)", e);
            }
            AppEvent::EnteringSleep { secs } => {
                info!("deep sleep for {}s", secs);
            }
        }
    }
}
