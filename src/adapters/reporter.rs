//! Collector link: one JSON line over a short-lived TCP connection.
//!
//! The collector listens on a fixed host:port; the node connects, writes
//! the serialized reading followed by a newline, and closes.  ESP-IDF's
//! lwIP stack backs `std::net`, so the same code path runs on target and
//! host — the tests below talk to a loopback listener.
//!
//! Delivery is fire-and-forget: a failure is reported to the caller for
//! logging and never retried within the wake cycle.

use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;

use crate::app::cycle::SensorReading;
use crate::app::ports::ReportPort;
use crate::config::SystemConfig;
use crate::error::ReportError;

/// Bounds every socket operation so a wedged collector cannot eat the
/// node's run window.
const IO_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TcpReporter {
    host: heapless::String<64>,
    port: u16,
}

impl TcpReporter {
    pub fn new(cfg: &SystemConfig) -> Self {
        Self {
            host: cfg.collector_host.clone(),
            port: cfg.collector_port,
        }
    }

    pub fn with_endpoint(host: &str, port: u16) -> Self {
        let mut h = heapless::String::new();
        // validate_config bounds the host length before it gets here.
        let _ = h.push_str(host);
        Self { host: h, port }
    }
}

impl ReportPort for TcpReporter {
    fn send(&mut self, reading: &SensorReading) -> Result<(), ReportError> {
        let mut payload =
            serde_json::to_vec(reading).map_err(|_| ReportError::EncodeFailed)?;
        payload.push(b'\n');

        // connect_timeout needs a resolved address; a black-holed
        // collector must not hold the socket open past IO_TIMEOUT.
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| ReportError::ConnectFailed)?
            .next()
            .ok_or(ReportError::ConnectFailed)?;
        let mut stream = TcpStream::connect_timeout(&addr, IO_TIMEOUT)
            .map_err(|_| ReportError::ConnectFailed)?;
        stream
            .set_write_timeout(Some(IO_TIMEOUT))
            .map_err(|_| ReportError::ConnectFailed)?;

        stream
            .write_all(&payload)
            .and_then(|()| stream.flush())
            .map_err(|_| ReportError::WriteFailed)?;

        debug!(
            "report #{}: {} bytes to {}:{}",
            reading.id,
            payload.len(),
            self.host,
            self.port
        );
        Ok(())
    }
}
