//! Hardware adapter: bundles the BME280 driver and the fan driver behind
//! the [`SensorPort`] and [`FanPort`] traits.
//!
//! The control loop takes one `impl SensorPort + FanPort` argument, so
//! sensor and actuator travel together as a single driven-adapter bundle.

use log::info;

use crate::app::ports::{FanPort, SensorPort, SensorSample};
use crate::drivers::fan::FanDriver;
use crate::drivers::hw_init;
use crate::error::{Error, Result, SensorError};
use crate::sensors::bme280::Bme280;

#[derive(Debug)]
pub struct HardwareAdapter {
    bme: Bme280,
    fan: FanDriver,
}

impl HardwareAdapter {
    /// Bring up the peripheral blocks (GPIO, LEDC, I²C, sensor power
    /// rail) and probe the sensor.  A sensor probe failure is fatal for
    /// the wake cycle: with no measurement there is nothing to control.
    pub fn init() -> Result<Self> {
        Self::bring_up(Bme280::new())
    }

    /// Host-only escape hatch: bring up with a pre-configured sensor.
    #[cfg(not(target_os = "espidf"))]
    pub fn init_with_sensor(bme: Bme280) -> Result<Self> {
        Self::bring_up(bme)
    }

    fn bring_up(mut bme: Bme280) -> Result<Self> {
        hw_init::init_peripherals().map_err(|_| Error::Init("peripheral bring-up failed"))?;

        if let Err(e) = bme.init() {
            // The rail came up during bring-up; a broken sensor must not
            // leave it powered through every sleep until it is replaced.
            hw_init::power_down_peripherals();
            return Err(Error::SensorInit(e));
        }

        info!("hardware online: BME280 + fan PWM");
        Ok(Self {
            bme,
            fan: FanDriver::new(),
        })
    }

    /// Tear down before deep sleep: fan off, sensor rail unpowered.
    pub fn shutdown(&mut self) {
        self.fan.stop();
        hw_init::power_down_peripherals();
    }

    pub fn fan_duty(&self) -> u8 {
        self.fan.current_duty()
    }

    /// Host-only escape hatch for injecting simulated readings.
    #[cfg(not(target_os = "espidf"))]
    pub fn sensor_mut(&mut self) -> &mut Bme280 {
        &mut self.bme
    }
}

impl SensorPort for HardwareAdapter {
    fn read_sample(&mut self) -> core::result::Result<SensorSample, SensorError> {
        self.bme.read()
    }
}

impl FanPort for HardwareAdapter {
    fn set_duty_percent(&mut self, percent: u8) {
        self.fan.set(percent);
    }

    fn off(&mut self) {
        self.fan.stop();
    }
}
