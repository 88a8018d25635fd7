//! Bridge configuration.
//!
//! Read once at startup and immutable afterwards.  Defaults come from the
//! build environment (`WIFI_SSID=... cargo build`) so credentials never
//! live in the source tree.  An unset `WIFI_SSID` falls back to
//! [`PLACEHOLDER_SSID`], and a build-time value too long for its field is
//! recorded in `env_overflow`; [`BridgeConfig::validate`] rejects both.

use serde::{Deserialize, Serialize};

use crate::adapters::utils::{validate_password, validate_ssid};
use crate::error::ConfigError;

pub type Text<const N: usize> = heapless::String<N>;

/// SSID used when `WIFI_SSID` is not set at build time.
pub const PLACEHOLDER_SSID: &str = "CHANGE_ME";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    // --- Identity ---
    /// Station hostname announced to DHCP.
    pub hostname: Text<32>,

    // --- WiFi ---
    pub wifi_ssid: Text<32>,
    pub wifi_password: Text<64>,

    // --- MQTT ---
    pub mqtt_host: Text<64>,
    pub mqtt_port: u16,
    pub mqtt_client_id: Text<32>,
    pub mqtt_user: Text<32>,
    pub mqtt_password: Text<64>,
    /// Telemetry topic; also the last-will topic.
    pub mqtt_topic: Text<64>,

    // --- HTTP / firmware update ---
    pub http_port: u16,
    pub update_path: Text<32>,
    pub update_user: Text<32>,
    pub update_password: Text<64>,

    // --- Inverter link ---
    pub inverter_baud: u32,
    pub inverter_address: u8,

    // --- Timing (milliseconds) ---
    /// Alive LED toggle period.
    pub alive_period_ms: u32,
    /// Acquisition cycle period.
    pub poll_period_ms: u32,
    /// Status poll cadence while the link recovers.
    pub link_poll_interval_ms: u32,
    /// Sleep between failed broker connects.
    pub session_retry_ms: u32,
    /// Yield at the end of every scheduler tick.
    pub loop_idle_ms: u32,
    /// Status polls before a silent association attempt is restarted.
    pub link_retry_polls: u32,

    /// First build-time variable that did not fit its field.
    #[serde(skip)]
    pub env_overflow: Option<&'static str>,
}

fn text<const N: usize>(s: &str) -> Text<N> {
    Text::try_from(s).unwrap_or_default()
}

/// `value` as a fixed-capacity string.  A value that does not fit leaves
/// the field empty and records `message` in `overflow`, keeping the first.
fn env_text<const N: usize>(
    value: &str,
    message: &'static str,
    overflow: &mut Option<&'static str>,
) -> Text<N> {
    Text::try_from(value).unwrap_or_else(|()| {
        overflow.get_or_insert(message);
        Text::new()
    })
}

macro_rules! build_env {
    ($var:literal, $fallback:expr, $overflow:expr) => {
        env_text(
            option_env!($var).unwrap_or($fallback),
            concat!($var, " is too long for its field"),
            $overflow,
        )
    };
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let mut overflow = None;
        let o = &mut overflow;
        Self {
            hostname: build_env!("BRIDGE_HOSTNAME", "Growatt", o),

            wifi_ssid: build_env!("WIFI_SSID", PLACEHOLDER_SSID, o),
            wifi_password: build_env!("WIFI_PASS", "", o),

            mqtt_host: build_env!("MQTT_HOST", "mqtt.local", o),
            mqtt_port: option_env!("MQTT_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(1883),
            mqtt_client_id: build_env!("MQTT_CLIENT_ID", "Growatt", o),
            mqtt_user: build_env!("MQTT_USER", "", o),
            mqtt_password: build_env!("MQTT_PASS", "", o),
            mqtt_topic: build_env!("MQTT_TOPIC", "solar/growatt", o),

            http_port: 80,
            update_path: text("/firmware"),
            update_user: build_env!("UPDATE_USER", "admin", o),
            update_password: build_env!("UPDATE_PASS", "", o),

            inverter_baud: 9600,
            inverter_address: 1,

            alive_period_ms: 500,
            poll_period_ms: 10_000,
            link_poll_interval_ms: 200,
            session_retry_ms: 5_000,
            loop_idle_ms: 10,
            link_retry_polls: 50,

            env_overflow: overflow,
        }
    }
}

impl BridgeConfig {
    /// Reject configurations the loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(message) = self.env_overflow {
            return Err(ConfigError(message));
        }
        validate_ssid(&self.wifi_ssid)?;
        if self.wifi_ssid == PLACEHOLDER_SSID {
            return Err(ConfigError("wifi_ssid is still the placeholder; set WIFI_SSID"));
        }
        validate_password(&self.wifi_password)?;

        if self.hostname.is_empty() {
            return Err(ConfigError("hostname must not be empty"));
        }
        if self.mqtt_host.is_empty() {
            return Err(ConfigError("mqtt_host must not be empty"));
        }
        if self.mqtt_port == 0 {
            return Err(ConfigError("mqtt_port must be non-zero"));
        }
        if self.mqtt_client_id.is_empty() {
            return Err(ConfigError("mqtt_client_id must not be empty"));
        }
        if self.mqtt_topic.is_empty() || self.mqtt_topic.contains(['#', '+']) {
            return Err(ConfigError("mqtt_topic must be a non-empty topic without wildcards"));
        }
        if self.http_port == 0 {
            return Err(ConfigError("http_port must be non-zero"));
        }
        if !self.update_path.starts_with('/')
            || matches!(self.update_path.as_str(), "/" | "/status")
        {
            return Err(ConfigError("update_path must start with '/' and not shadow / or /status"));
        }
        if self.inverter_baud == 0 {
            return Err(ConfigError("inverter_baud must be non-zero"));
        }
        if self.alive_period_ms == 0
            || self.poll_period_ms == 0
            || self.link_poll_interval_ms == 0
            || self.session_retry_ms == 0
            || self.link_retry_polls == 0
        {
            return Err(ConfigError("timing periods must be non-zero"));
        }
        if self.alive_period_ms >= self.poll_period_ms {
            return Err(ConfigError("alive_period_ms must be shorter than poll_period_ms"));
        }
        Ok(())
    }
}
