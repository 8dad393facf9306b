//! One-shot hardware peripheral initialization.
//!
//! Configures the sensor power GPIO, the fan LEDC timer/channel, and the
//! I²C master using raw ESP-IDF sys calls.  Called once from `main()`
//! before the control cycle starts; `power_down_peripherals()` undoes the
//! power gating just before deep sleep.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::pins;

#[cfg(target_os = "espidf")]
use log::info;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
    I2cInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
            Self::I2cInitFailed(rc) => write!(f, "I2C master init failed (rc={})", rc),
        }
    }
}

// ── Bring-up / tear-down ──────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_gpio_outputs()?;
        init_ledc()?;
        init_i2c()?;
    }
    // Power the sensor rail and give the BME280 its 2 ms start-up time.
    gpio_write(pins::BME_POWER_GPIO, true);
    unsafe { esp_rom_delay_us(2_000) };
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    gpio_write(pins::BME_POWER_GPIO, true);
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

/// Cut the sensor rail before deep sleep (runs on every exit path).
pub fn power_down_peripherals() {
    ledc_set(pins::FAN_PWM_CHANNEL, 0);
    gpio_write(pins::BME_POWER_GPIO, false);
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::BME_POWER_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(gpio: i32, high: bool) {
    // SAFETY: gpio_set_level on a configured output pin; no shared state.
    unsafe {
        gpio_set_level(gpio, u32::from(high));
    }
}

// The sim tracks the sensor rail level so tests can assert that no exit
// path sleeps with the rail powered.
#[cfg(not(target_os = "espidf"))]
static SIM_BME_RAIL: core::sync::atomic::AtomicBool = core::sync::atomic::AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(gpio: i32, high: bool) {
    if gpio == pins::BME_POWER_GPIO {
        SIM_BME_RAIL.store(high, core::sync::atomic::Ordering::Relaxed);
    }
}

/// Host-only: current sim level of the sensor power rail.
#[cfg(not(target_os = "espidf"))]
pub fn sim_rail_powered() -> bool {
    SIM_BME_RAIL.load(core::sync::atomic::Ordering::Relaxed)
}

// ── LEDC (fan PWM) ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    let timer_cfg = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        duty_resolution: pins::PWM_RESOLUTION_BITS,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        freq_hz: pins::FAN_PWM_FREQ_HZ,
        clk_cfg: ledc_clk_cfg_t_LEDC_AUTO_CLK,
        deconfigure: false,
    };
    let ret = unsafe { ledc_timer_config(&timer_cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    let ch_cfg = ledc_channel_config_t {
        gpio_num: pins::FAN_PWM_GPIO,
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel: pins::FAN_PWM_CHANNEL,
        intr_type: ledc_intr_type_t_LEDC_INTR_DISABLE,
        timer_sel: ledc_timer_t_LEDC_TIMER_0,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    };
    let ret = unsafe { ledc_channel_config(&ch_cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::LedcInitFailed(ret));
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty_8bit: u8) {
    // SAFETY: channel was configured in init_ledc; single writer.
    unsafe {
        ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty_8bit));
        ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty_8bit: u8) {}

// ── I²C master ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const I2C_PORT: i32 = 0;
#[cfg(target_os = "espidf")]
const I2C_TIMEOUT_TICKS: u32 = 100;

#[cfg(target_os = "espidf")]
unsafe fn init_i2c() -> Result<(), HwInitError> {
    let cfg = i2c_config_t {
        mode: i2c_mode_t_I2C_MODE_MASTER,
        sda_io_num: pins::I2C_SDA_GPIO,
        scl_io_num: pins::I2C_SCL_GPIO,
        sda_pullup_en: true,
        scl_pullup_en: true,
        __bindgen_anon_1: i2c_config_t__bindgen_ty_1 {
            master: i2c_config_t__bindgen_ty_1__bindgen_ty_1 {
                clk_speed: 100_000,
            },
        },
        ..Default::default()
    };
    let ret = unsafe { i2c_param_config(I2C_PORT, &cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::I2cInitFailed(ret));
    }
    let ret = unsafe { i2c_driver_install(I2C_PORT, i2c_mode_t_I2C_MODE_MASTER, 0, 0, 0) };
    if ret != ESP_OK {
        return Err(HwInitError::I2cInitFailed(ret));
    }
    Ok(())
}

/// Write one register on an I²C device.
#[cfg(target_os = "espidf")]
pub fn i2c_write_reg(addr: u8, reg: u8, value: u8) -> Result<(), i32> {
    let buf = [reg, value];
    // SAFETY: driver installed in init_i2c; single-threaded access.
    let ret = unsafe {
        i2c_master_write_to_device(
            I2C_PORT,
            addr,
            buf.as_ptr(),
            buf.len(),
            I2C_TIMEOUT_TICKS,
        )
    };
    if ret != ESP_OK { Err(ret) } else { Ok(()) }
}

/// Read `buf.len()` consecutive registers starting at `reg`.
#[cfg(target_os = "espidf")]
pub fn i2c_read_regs(addr: u8, reg: u8, buf: &mut [u8]) -> Result<(), i32> {
    // SAFETY: driver installed in init_i2c; single-threaded access.
    let ret = unsafe {
        i2c_master_write_read_device(
            I2C_PORT,
            addr,
            &reg,
            1,
            buf.as_mut_ptr(),
            buf.len(),
            I2C_TIMEOUT_TICKS,
        )
    };
    if ret != ESP_OK { Err(ret) } else { Ok(()) }
}

/// Read one register.
#[cfg(target_os = "espidf")]
pub fn i2c_read_reg(addr: u8, reg: u8) -> Result<u8, i32> {
    let mut buf = [0u8; 1];
    i2c_read_regs(addr, reg, &mut buf)?;
    Ok(buf[0])
}
