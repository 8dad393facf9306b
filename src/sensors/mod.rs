//! Sensor subsystem.
//!
//! One chip on this board: the BME280 environmental sensor.  The driver
//! here is deliberately thin glue — the domain core only consumes the
//! [`SensorPort`](crate::app::ports::SensorPort) contract (value or
//! failure) and never sees registers.

pub mod bme280;
