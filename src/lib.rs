//! Fanstat firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod power;
pub mod retained;

pub mod error;
mod pins;

// The ESP-IDF-only code paths inside these are guarded by cfg attributes;
// the host sees the simulation implementations.
pub mod adapters;
pub mod drivers;
pub mod sensors;
