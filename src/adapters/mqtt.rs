//! MQTT session adapter.
//!
//! Implements [`SessionPort`] over `esp_idf_svc::mqtt::client::EspMqttClient`.
//! The ESP-IDF client runs its own task; connection state reaches the
//! scheduling loop through an atomic flag set from the event callback.
//!
//! Each `connect` builds a fresh client with the last-will registered, and
//! waits a bounded time for the broker's CONNACK.  A client that lost its
//! broker is torn down on the next `connect` rather than left to its own
//! reconnect timer, so the supervisor stays the only retry policy.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{SessionOptions, SessionPort};
use crate::error::SessionError;

pub struct MqttAdapter {
    url: Option<String>,
    connected: Arc<AtomicBool>,
    #[cfg(target_os = "espidf")]
    client: Option<esp_idf_svc::mqtt::client::EspMqttClient<'static>>,
    /// Host simulation: every publish, newest last.
    #[cfg(not(target_os = "espidf"))]
    sim_published: std::vec::Vec<(String, std::vec::Vec<u8>, bool)>,
}

impl Default for MqttAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MqttAdapter {
    pub fn new() -> Self {
        Self {
            url: None,
            connected: Arc::new(AtomicBool::new(false)),
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(not(target_os = "espidf"))]
            sim_published: std::vec::Vec::new(),
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_published(&self) -> &[(String, std::vec::Vec<u8>, bool)] {
        &self.sim_published
    }

    /// Simulate the broker dropping the session.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop(&mut self) {
        self.connected.store(false, Ordering::Release);
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, url: &str, options: &SessionOptions<'_>) -> Result<(), SessionError> {
        use esp_idf_hal::delay::FreeRtos;
        use esp_idf_svc::mqtt::client::{
            EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration, QoS,
        };

        const CONNACK_TIMEOUT_MS: u32 = 3_000;
        const CONNACK_POLL_MS: u32 = 50;

        // Drop any previous client first so only one task talks to the broker.
        self.client = None;
        self.connected.store(false, Ordering::Release);

        let conf = MqttClientConfiguration {
            client_id: Some(options.client_id),
            username: (!options.user.is_empty()).then_some(options.user),
            password: (!options.password.is_empty()).then_some(options.password),
            lwt: Some(LwtConfiguration {
                topic: options.will.topic,
                payload: options.will.payload.as_bytes(),
                qos: if options.will.qos == 0 { QoS::AtMostOnce } else { QoS::AtLeastOnce },
                retain: options.will.retain,
            }),
            ..Default::default()
        };

        let flag = self.connected.clone();
        let client = EspMqttClient::new_cb(url, &conf, move |event| match event.payload() {
            EventPayload::Connected(_) => flag.store(true, Ordering::Release),
            EventPayload::Disconnected => flag.store(false, Ordering::Release),
            _ => {}
        })
        .map_err(|e| {
            warn!("MQTT: client creation failed: {:?}", e);
            SessionError::ConnectFailed
        })?;

        let mut waited = 0;
        while !self.connected.load(Ordering::Acquire) {
            if waited >= CONNACK_TIMEOUT_MS {
                return Err(SessionError::ConnectFailed);
            }
            FreeRtos::delay_ms(CONNACK_POLL_MS);
            waited += CONNACK_POLL_MS;
        }
        self.client = Some(client);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, _url: &str, _options: &SessionOptions<'_>) -> Result<(), SessionError> {
        self.connected.store(true, Ordering::Release);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SessionError> {
        use esp_idf_svc::mqtt::client::QoS;

        let Some(client) = self.client.as_mut() else {
            return Err(SessionError::PublishFailed);
        };
        client
            .enqueue(topic, QoS::AtLeastOnce, retain, payload)
            .map(|_| ())
            .map_err(|e| {
                warn!("MQTT: enqueue failed: {:?}", e);
                SessionError::PublishFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SessionError> {
        self.sim_published.push((topic.into(), payload.to_vec(), retain));
        Ok(())
    }
}

impl SessionPort for MqttAdapter {
    fn set_server(&mut self, host: &str, port: u16) {
        self.url = Some(format!("mqtt://{host}:{port}"));
    }

    fn connect(&mut self, options: &SessionOptions<'_>) -> Result<(), SessionError> {
        let Some(url) = self.url.clone() else {
            return Err(SessionError::NoServer);
        };
        self.platform_connect(&url, options)?;
        info!("MQTT: connected to {} as '{}'", url, options.client_id);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::PublishFailed);
        }
        self.platform_publish(topic, payload, retain)
    }

    /// Keep-alives and inbound traffic are handled on the client's own
    /// task; nothing to pump from the loop.
    fn maintain(&mut self) {}
}
