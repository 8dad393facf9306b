//! Hardware drivers (actuators and peripheral bring-up).

pub mod fan;
pub mod hw_init;
