//! Application core — hardware-agnostic domain logic.
//!
//! Everything in here is pure logic over the port traits in
//! [`ports`]; adapters on the outside supply real hardware.

pub mod cycle;
pub mod events;
pub mod ports;
