//! BME280 temperature/humidity/pressure sensor (I²C, power-gated rail).
//!
//! Thin register glue: init probes the chip-id register, loads the
//! factory calibration words, and configures forced-mode sampling; read
//! pulls the raw measurement block and applies Bosch's floating-point
//! compensation.  Anything smarter (oversampling tuning, IIR filtering)
//! is out of scope for a node that takes one sample every five seconds.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: real I²C transactions via the hw_init helpers.
//! On host/test: readings come from per-instance injectable values.

use log::info;

use crate::app::ports::SensorSample;
use crate::error::SensorError;
use crate::pins;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

/// BME280 chip-id register value.
#[cfg(target_os = "espidf")]
const CHIP_ID: u8 = 0x60;

#[cfg(target_os = "espidf")]
mod regs {
    pub const CHIP_ID: u8 = 0xD0;
    pub const CALIB_00: u8 = 0x88; // dig_T*, dig_P*, dig_H1 (26 bytes)
    pub const CALIB_26: u8 = 0xE1; // dig_H2..dig_H6 (7 bytes)
    pub const CTRL_HUM: u8 = 0xF2;
    pub const CTRL_MEAS: u8 = 0xF4;
    pub const DATA_START: u8 = 0xF7; // press/temp/hum raw block (8 bytes)
}

// ── Calibration data (datasheet §4.2.2) ───────────────────────

#[cfg(target_os = "espidf")]
#[derive(Debug, Clone, Copy, Default)]
struct Calibration {
    t1: f64, t2: f64, t3: f64,
    p1: f64, p2: f64, p3: f64, p4: f64, p5: f64,
    p6: f64, p7: f64, p8: f64, p9: f64,
    h1: f64, h2: f64, h3: f64, h4: f64, h5: f64, h6: f64,
}

#[cfg(target_os = "espidf")]
impl Calibration {
    fn parse(lo: &[u8; 26], hi: &[u8; 7]) -> Self {
        let u16le = |b: &[u8], i: usize| u16::from_le_bytes([b[i], b[i + 1]]);
        let i16le = |b: &[u8], i: usize| i16::from_le_bytes([b[i], b[i + 1]]);
        Self {
            t1: f64::from(u16le(lo, 0)),
            t2: f64::from(i16le(lo, 2)),
            t3: f64::from(i16le(lo, 4)),
            p1: f64::from(u16le(lo, 6)),
            p2: f64::from(i16le(lo, 8)),
            p3: f64::from(i16le(lo, 10)),
            p4: f64::from(i16le(lo, 12)),
            p5: f64::from(i16le(lo, 14)),
            p6: f64::from(i16le(lo, 16)),
            p7: f64::from(i16le(lo, 18)),
            p8: f64::from(i16le(lo, 20)),
            p9: f64::from(i16le(lo, 22)),
            h1: f64::from(lo[25]),
            h2: f64::from(i16le(hi, 0)),
            h3: f64::from(hi[2]),
            // H4/H5 share a nibble-packed byte.
            h4: f64::from((i16::from(hi[3] as i8) << 4) | i16::from(hi[4] & 0x0F)),
            h5: f64::from((i16::from(hi[5] as i8) << 4) | i16::from(hi[4] >> 4)),
            h6: f64::from(hi[6] as i8),
        }
    }
}

/// BME280 driver handle.
#[derive(Debug)]
pub struct Bme280 {
    addr: u8,
    initialized: bool,
    #[cfg(target_os = "espidf")]
    calib: Calibration,
    #[cfg(not(target_os = "espidf"))]
    sim: SimState,
}

/// Host-side stand-in: deterministic, per-instance, no globals.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, Copy)]
struct SimState {
    temperature_c: f32,
    humidity_pct: f32,
    pressure_hpa: f32,
    fail: bool,
}

#[cfg(not(target_os = "espidf"))]
impl Default for SimState {
    fn default() -> Self {
        Self {
            temperature_c: 25.0,
            humidity_pct: 40.0,
            pressure_hpa: 1013.0,
            fail: false,
        }
    }
}

impl Bme280 {
    pub fn new() -> Self {
        Self {
            addr: pins::BME280_I2C_ADDR,
            initialized: false,
            #[cfg(target_os = "espidf")]
            calib: Calibration::default(),
            #[cfg(not(target_os = "espidf"))]
            sim: SimState::default(),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_reading(&mut self, temperature_c: f32, humidity_pct: f32, pressure_hpa: f32) {
        self.sim.temperature_c = temperature_c;
        self.sim.humidity_pct = humidity_pct;
        self.sim.pressure_hpa = pressure_hpa;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_fail(&mut self, fail: bool) {
        self.sim.fail = fail;
    }

    /// Probe the chip, load calibration, configure forced-mode sampling.
    ///
    /// Failure here is fatal for the whole wake cycle: with no sensor
    /// there is nothing to control, so the caller skips straight to
    /// sleep.
    pub fn init(&mut self) -> Result<(), SensorError> {
        #[cfg(target_os = "espidf")]
        {
            let id = hw_init::i2c_read_reg(self.addr, regs::CHIP_ID)
                .map_err(|_| SensorError::BusError)?;
            if id != CHIP_ID {
                return Err(SensorError::BadChipId);
            }

            let mut lo = [0u8; 26];
            let mut hi = [0u8; 7];
            hw_init::i2c_read_regs(self.addr, regs::CALIB_00, &mut lo)
                .map_err(|_| SensorError::BusError)?;
            hw_init::i2c_read_regs(self.addr, regs::CALIB_26, &mut hi)
                .map_err(|_| SensorError::BusError)?;
            self.calib = Calibration::parse(&lo, &hi);

            // Humidity ×1, then temp/pressure ×1 + normal mode.  ctrl_hum
            // must be written before ctrl_meas to take effect.
            hw_init::i2c_write_reg(self.addr, regs::CTRL_HUM, 0x01)
                .map_err(|_| SensorError::BusError)?;
            hw_init::i2c_write_reg(self.addr, regs::CTRL_MEAS, 0x27)
                .map_err(|_| SensorError::BusError)?;
        }

        #[cfg(not(target_os = "espidf"))]
        {
            if self.sim.fail {
                return Err(SensorError::BusError);
            }
        }

        self.initialized = true;
        info!("BME280 online at 0x{:02X}", self.addr);
        Ok(())
    }

    /// Take one compensated sample.
    pub fn read(&mut self) -> Result<SensorSample, SensorError> {
        if !self.initialized {
            return Err(SensorError::NotReady);
        }

        #[cfg(target_os = "espidf")]
        {
            let mut block = [0u8; 8];
            hw_init::i2c_read_regs(self.addr, regs::DATA_START, &mut block)
                .map_err(|_| SensorError::BusError)?;

            let raw_p = (u32::from(block[0]) << 12)
                | (u32::from(block[1]) << 4)
                | (u32::from(block[2]) >> 4);
            let raw_t = (u32::from(block[3]) << 12)
                | (u32::from(block[4]) << 4)
                | (u32::from(block[5]) >> 4);
            let raw_h = (u32::from(block[6]) << 8) | u32::from(block[7]);

            // All-ones ADC values mean the conversion never ran.
            if raw_t == 0x8_0000 && raw_p == 0x8_0000 {
                return Err(SensorError::InvalidReading);
            }

            let (t, t_fine) = self.compensate_temperature(raw_t);
            let p = self.compensate_pressure(raw_p, t_fine);
            let h = self.compensate_humidity(raw_h, t_fine);
            if t.is_nan() || !(-45.0..=90.0).contains(&t) {
                return Err(SensorError::InvalidReading);
            }
            Ok(SensorSample {
                temperature_c: t as f32,
                humidity_pct: h as f32,
                pressure_hpa: (p / 100.0) as f32,
            })
        }

        #[cfg(not(target_os = "espidf"))]
        {
            if self.sim.fail {
                return Err(SensorError::BusError);
            }
            Ok(SensorSample {
                temperature_c: self.sim.temperature_c,
                humidity_pct: self.sim.humidity_pct,
                pressure_hpa: self.sim.pressure_hpa,
            })
        }
    }

    // ── Bosch floating-point compensation (datasheet §4.2.3) ──

    #[cfg(target_os = "espidf")]
    fn compensate_temperature(&self, raw: u32) -> (f64, f64) {
        let c = &self.calib;
        let adc = f64::from(raw);
        let var1 = (adc / 16384.0 - c.t1 / 1024.0) * c.t2;
        let var2 = (adc / 131072.0 - c.t1 / 8192.0).powi(2) * c.t3;
        let t_fine = var1 + var2;
        (t_fine / 5120.0, t_fine)
    }

    #[cfg(target_os = "espidf")]
    fn compensate_pressure(&self, raw: u32, t_fine: f64) -> f64 {
        let c = &self.calib;
        let mut var1 = t_fine / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * c.p6 / 32768.0;
        var2 += var1 * c.p5 * 2.0;
        var2 = var2 / 4.0 + c.p4 * 65536.0;
        var1 = (c.p3 * var1 * var1 / 524288.0 + c.p2 * var1) / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * c.p1;
        if var1 == 0.0 {
            return f64::NAN;
        }
        let mut p = 1048576.0 - f64::from(raw);
        p = (p - var2 / 4096.0) * 6250.0 / var1;
        let var1 = c.p9 * p * p / 2147483648.0;
        let var2 = p * c.p8 / 32768.0;
        p + (var1 + var2 + c.p7) / 16.0
    }

    #[cfg(target_os = "espidf")]
    fn compensate_humidity(&self, raw: u32, t_fine: f64) -> f64 {
        let c = &self.calib;
        let mut h = t_fine - 76800.0;
        h = (f64::from(raw) - (c.h4 * 64.0 + c.h5 / 16384.0 * h))
            * (c.h2 / 65536.0
                * (1.0 + c.h6 / 67108864.0 * h * (1.0 + c.h3 / 67108864.0 * h)));
        h *= 1.0 - c.h1 * h / 524288.0;
        h.clamp(0.0, 100.0)
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn read_before_init_is_not_ready() {
        let mut bme = Bme280::new();
        assert_eq!(bme.read().unwrap_err(), SensorError::NotReady);
    }

    #[test]
    fn injected_reading_round_trips() {
        let mut bme = Bme280::new();
        bme.init().unwrap();
        bme.sim_set_reading(22.5, 55.0, 1001.3);
        let s = bme.read().unwrap();
        assert_eq!(s.temperature_c, 22.5);
        assert_eq!(s.humidity_pct, 55.0);
        assert_eq!(s.pressure_hpa, 1001.3);
        assert!(s.is_valid());
    }

    #[test]
    fn bus_fault_surfaces_as_read_error() {
        let mut bme = Bme280::new();
        bme.init().unwrap();
        bme.sim_set_fail(true);
        assert_eq!(bme.read().unwrap_err(), SensorError::BusError);
    }
}
