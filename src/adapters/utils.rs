//! Shared validation helpers for credentials.
//!
//! Used by the WiFi adapter and by [`BridgeConfig::validate`](crate::config::BridgeConfig::validate).

use crate::error::ConfigError;

/// Space through tilde only.
pub(crate) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_graphic() || b == b' ')
}

/// SSID: 1-32 printable ASCII bytes.
pub(crate) fn validate_ssid(ssid: &str) -> Result<(), ConfigError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConfigError("wifi_ssid must be 1-32 printable ASCII bytes"));
    }
    Ok(())
}

/// WPA2 passphrase: 8-64 bytes, or empty for an open network.
pub(crate) fn validate_password(password: &str) -> Result<(), ConfigError> {
    if password.is_empty() {
        return Ok(());
    }
    if !(8..=64).contains(&password.len()) {
        return Err(ConfigError("wifi_password must be 8-64 bytes, or empty for open networks"));
    }
    Ok(())
}
