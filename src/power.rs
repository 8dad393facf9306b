//! Deep-sleep entry and wake-cause classification.
//!
//! The node spends almost all of its life asleep: every code path in
//! `main` ends in [`enter_deep_sleep`], including the failure paths.  A
//! crash-loop that never sleeps would flatten the battery in hours.

use log::info;

/// Why this wake cycle is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Cold start: power applied or reset button.
    PowerOn,
    /// The deep-sleep timer expired (the normal steady-state case).
    Timer,
    /// Some other RTC wake source fired.
    Other,
}

impl WakeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PowerOn => "power-on",
            Self::Timer => "timer",
            Self::Other => "other",
        }
    }
}

/// Classify what woke the chip.
pub fn wake_reason() -> WakeReason {
    #[cfg(target_os = "espidf")]
    {
        use esp_idf_svc::sys::{
            esp_sleep_get_wakeup_cause, esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER,
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED,
        };
        // SAFETY: plain read of the boot-time wake cause.
        let cause = unsafe { esp_sleep_get_wakeup_cause() };
        if cause == esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER {
            WakeReason::Timer
        } else if cause == esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED {
            WakeReason::PowerOn
        } else {
            WakeReason::Other
        }
    }

    #[cfg(not(target_os = "espidf"))]
    {
        WakeReason::PowerOn
    }
}

/// Enter timer-armed deep sleep.  Does not return on target; on the host
/// it ends the process so simulations terminate cleanly.
pub fn enter_deep_sleep(secs: u32) -> ! {
    info!("entering deep sleep for {secs}s");

    #[cfg(target_os = "espidf")]
    {
        let us = u64::from(secs) * 1_000_000;
        // SAFETY: terminal call; the chip resets into a fresh boot on wake.
        unsafe { esp_idf_svc::sys::esp_deep_sleep(us) };
        // esp_deep_sleep never returns.
        unreachable!()
    }

    #[cfg(not(target_os = "espidf"))]
    {
        std::process::exit(0);
    }
}
