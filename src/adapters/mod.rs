//! Adapters — concrete implementations of the port traits.
//!
//! Each adapter is cfg-gated: real peripheral/network access on
//! `target_os = "espidf"`, a deterministic simulation everywhere else so
//! the whole stack runs under `cargo test` on the host.

pub mod hardware;
pub mod log_sink;
pub mod reporter;
pub mod rtc_store;
pub mod time;
pub mod wifi;
