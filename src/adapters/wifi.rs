//! Wi-Fi station adapter.
//!
//! A battery node has no business running a reconnection state machine:
//! it associates once per wake cycle with a bounded attempt budget, holds
//! the link just long enough to push one report, and sleeps.  If the AP
//! is unreachable the cycle simply runs unreported — control never waits
//! on the network.
//!
//! ## cfg gating
//!
//! - `target_os = "espidf"`: real station association via
//!   `esp_idf_svc::wifi::{EspWifi, BlockingWifi}`, RSSI from
//!   `esp_wifi_sta_get_ap_info`.
//! - host: a scriptable simulation for tests (first N attempts fail).

use log::{info, warn};

use crate::error::NetworkError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

// ───────────────────────────────────────────────────────────────
// Credential validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), NetworkError> {
    if ssid.is_empty() {
        return Err(NetworkError::NoCredentials);
    }
    if ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(NetworkError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), NetworkError> {
    if password.is_empty() {
        return Ok(()); // open network
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(NetworkError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    connected: bool,
    last_rssi: Option<i8>,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    /// Simulation: the first N `platform_connect` calls fail.
    #[cfg(not(target_os = "espidf"))]
    sim_fail_first: u32,
    #[cfg(not(target_os = "espidf"))]
    sim_attempt: u32,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self, NetworkError> {
        let esp_wifi =
            EspWifi::new(modem, sysloop.clone(), Some(nvs)).map_err(|_| NetworkError::Driver)?;
        let wifi = BlockingWifi::wrap(esp_wifi, sysloop).map_err(|_| NetworkError::Driver)?;
        Ok(Self {
            connected: false,
            last_rssi: None,
            wifi,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            connected: false,
            last_rssi: None,
            sim_fail_first: 0,
            sim_attempt: 0,
        }
    }

    /// Simulation control: make the first `n` association attempts fail.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail_first(&mut self, n: u32) {
        self.sim_fail_first = n;
        self.sim_attempt = 0;
    }

    /// Associate with the AP, retrying up to `max_attempts` times with
    /// `attempt_delay_ms` between tries.  A dead AP must cost seconds of
    /// battery, not the whole run window.
    pub fn connect(
        &mut self,
        ssid: &str,
        password: &str,
        max_attempts: u32,
        attempt_delay_ms: u32,
    ) -> Result<(), NetworkError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        if self.connected {
            return Ok(());
        }

        self.platform_configure(ssid, password)?;

        let mut last_err = NetworkError::AssociationTimeout;
        for attempt in 1..=max_attempts.max(1) {
            match self.platform_connect() {
                Ok(()) => {
                    self.connected = true;
                    self.last_rssi = self.platform_rssi();
                    info!(
                        "wifi: associated with '{}' on attempt {} (RSSI={:?})",
                        ssid, attempt, self.last_rssi
                    );
                    return Ok(());
                }
                Err(e) => {
                    warn!("wifi: attempt {}/{} failed: {}", attempt, max_attempts, e);
                    last_err = e;
                    if attempt < max_attempts {
                        std::thread::sleep(std::time::Duration::from_millis(u64::from(
                            attempt_delay_ms,
                        )));
                    }
                }
            }
        }
        Err(last_err)
    }

    /// Drop the association and stop the radio before deep sleep.
    pub fn disconnect(&mut self) {
        self.platform_disconnect();
        self.connected = false;
        self.last_rssi = None;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Signal strength of the associated AP, captured at association.
    pub fn rssi(&self) -> Option<i8> {
        self.last_rssi
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_configure(&mut self, ssid: &str, password: &str) -> Result<(), NetworkError> {
        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: ssid.try_into().map_err(|_| NetworkError::InvalidSsid)?,
                password: password
                    .try_into()
                    .map_err(|_| NetworkError::InvalidPassword)?,
                auth_method,
                ..Default::default()
            }))
            .map_err(|_| NetworkError::Driver)?;
        self.wifi.start().map_err(|_| NetworkError::Driver)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_configure(&mut self, _ssid: &str, _password: &str) -> Result<(), NetworkError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), NetworkError> {
        self.wifi
            .connect()
            .map_err(|_| NetworkError::AssociationTimeout)?;
        self.wifi
            .wait_netif_up()
            .map_err(|_| NetworkError::AssociationTimeout)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), NetworkError> {
        self.sim_attempt += 1;
        if self.sim_attempt <= self.sim_fail_first {
            return Err(NetworkError::AssociationTimeout);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        let _ = self.wifi.disconnect();
        let _ = self.wifi.stop();
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {}

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        let mut ap_info = esp_idf_svc::sys::wifi_ap_record_t::default();
        // SAFETY: ap_info is a valid out-pointer; call is read-only.
        let rc = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        (rc == esp_idf_svc::sys::ESP_OK).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        Some(-55)
    }
}
