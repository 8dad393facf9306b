//! PWM fan driver (4-wire PC fan, 25 kHz control line).
//!
//! Variable-speed control via LEDC PWM.  The fan is a dumb actuator: the
//! control policy (PID, fail-safe off) lives in the orchestrator; this
//! driver just scales percent to counts and tracks what it last wrote.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanState {
    Stopped,
    Running { duty: u8 },
}

#[derive(Debug)]
pub struct FanDriver {
    state: FanState,
    hw_duty: u8,
}

impl FanDriver {
    pub fn new() -> Self {
        Self {
            state: FanState::Stopped,
            hw_duty: 0,
        }
    }

    /// Set fan speed as a duty-cycle percentage (0 stops the fan).
    pub fn set(&mut self, duty: u8) {
        let duty = duty.min(100);
        if duty == 0 {
            self.stop();
            return;
        }

        self.set_duty_hw(duty);
        self.hw_duty = duty;
        self.state = FanState::Running { duty };
    }

    pub fn stop(&mut self) {
        self.set_duty_hw(0);
        self.hw_duty = 0;
        self.state = FanState::Stopped;
    }

    fn set_duty_hw(&self, duty: u8) {
        let duty_8bit = ((duty as u16) * 255 / 100) as u8;
        hw_init::ledc_set(pins::FAN_PWM_CHANNEL, duty_8bit);
    }

    pub fn state(&self) -> FanState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.state, FanState::Stopped)
    }

    pub fn current_duty(&self) -> u8 {
        self.hw_duty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_stop() {
        let mut fan = FanDriver::new();
        fan.set(40);
        assert_eq!(fan.state(), FanState::Running { duty: 40 });
        assert_eq!(fan.current_duty(), 40);
        fan.stop();
        assert_eq!(fan.state(), FanState::Stopped);
        assert_eq!(fan.current_duty(), 0);
    }

    #[test]
    fn zero_duty_stops() {
        let mut fan = FanDriver::new();
        fan.set(80);
        fan.set(0);
        assert!(!fan.is_running());
    }

    #[test]
    fn duty_is_capped_at_100() {
        let mut fan = FanDriver::new();
        fan.set(250);
        assert_eq!(fan.current_duty(), 100);
    }
}
