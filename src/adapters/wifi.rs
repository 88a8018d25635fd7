//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`].  `begin` only (re)configures the station and
//! kicks off association; the supervisor polls `is_connected` for the
//! outcome, so nothing in here blocks.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::EspWifi`.
//! - **all other targets**: simulation stub that associates instantly.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::adapters::utils::{validate_password, validate_ssid};
use crate::app::ports::LinkPort;
use crate::config::Text;
use crate::error::LinkError;

pub struct WifiAdapter {
    hostname: Text<32>,
    #[cfg(target_os = "espidf")]
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
    #[cfg(not(target_os = "espidf"))]
    sim_connected: bool,
    /// Association attempts since boot.
    attempts: u32,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(
        modem: esp_idf_hal::modem::Modem,
        sys_loop: esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: esp_idf_svc::nvs::EspDefaultNvsPartition,
        hostname: &str,
    ) -> anyhow::Result<Self> {
        let mut wifi = esp_idf_svc::wifi::EspWifi::new(modem, sys_loop, Some(nvs))?;
        if let Err(e) = wifi.sta_netif_mut().set_hostname(hostname) {
            warn!("WiFi: hostname '{}' rejected: {:?}", hostname, e);
        }
        Ok(Self {
            hostname: Text::try_from(hostname).unwrap_or_default(),
            wifi,
            attempts: 0,
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: Text::try_from(hostname).unwrap_or_default(),
            sim_connected: false,
            attempts: 0,
        }
    }

    /// Simulate the access point going away.
    pub fn sim_drop(&mut self) {
        self.sim_connected = false;
    }
}

impl WifiAdapter {
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_begin(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPAWPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| LinkError::ConfigRejected)?,
            password: password.try_into().map_err(|_| LinkError::ConfigRejected)?,
            auth_method,
            ..Default::default()
        });

        // A stale association must be torn down before reconfiguring.
        let _ = self.wifi.disconnect();
        self.wifi.set_configuration(&conf).map_err(|e| {
            warn!("WiFi: set_configuration failed: {:?}", e);
            LinkError::ConfigRejected
        })?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|e| {
                warn!("WiFi: start failed: {:?}", e);
                LinkError::StartFailed
            })?;
        }
        self.wifi.connect().map_err(|e| {
            warn!("WiFi: connect failed: {:?}", e);
            LinkError::StartFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin(&mut self, _ssid: &str, _password: &str) -> Result<(), LinkError> {
        self.sim_connected = true;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        // Associated and holding an address.
        self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_connected
    }
}

impl LinkPort for WifiAdapter {
    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        validate_ssid(ssid).map_err(|_| LinkError::ConfigRejected)?;
        validate_password(password).map_err(|_| LinkError::ConfigRejected)?;
        self.attempts = self.attempts.wrapping_add(1);
        info!(
            "WiFi: associating with '{}' as '{}' (attempt {})",
            ssid, self.hostname, self.attempts
        );
        self.platform_begin(ssid, password)
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }
}
