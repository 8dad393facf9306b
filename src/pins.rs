//! GPIO / peripheral pin assignments for the fanstat sensor node.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// BME280 environmental sensor (I²C, power-gated)
// ---------------------------------------------------------------------------

/// Digital output: powers the BME280 rail (HIGH = on).  The sensor draws
/// ~3 µA in sleep but the breakout's regulator does not, so the whole
/// rail is switched off before deep sleep.
pub const BME_POWER_GPIO: i32 = 12;

/// BME280 I²C address (SDO tied low).
pub const BME280_I2C_ADDR: u8 = 0x76;

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;

// ---------------------------------------------------------------------------
// Fan (4-wire PC fan, PWM control line)
// ---------------------------------------------------------------------------

/// LEDC PWM output to the fan's control line.
pub const FAN_PWM_GPIO: i32 = 13;
/// LEDC channel dedicated to the fan.
pub const FAN_PWM_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency (25 kHz — the Intel 4-wire fan spec, inaudible).
pub const FAN_PWM_FREQ_HZ: u32 = 25_000;
