//! Monotonic clock adapter.
//!
//! On ESP-IDF the timebase is `esp_timer_get_time()` (microseconds since
//! boot, monotonic across light sleep).  On the host it is an `Instant`
//! captured at construction, which keeps `now_ms()` starting near zero on
//! both targets.

use crate::app::ports::ClockPort;

#[cfg(not(target_os = "espidf"))]
use std::time::Instant;

pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now_ms(&self) -> u64 {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: esp_timer_get_time has no preconditions after boot.
            let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
            (us / 1000) as u64
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.origin.elapsed().as_millis() as u64
        }
    }

    fn sleep_ms(&self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
