//! Port traits: the hexagonal boundary between the scheduling loop and
//! the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BridgeService (domain)
//! ```
//!
//! Driven adapters (WiFi station, MQTT client, inverter link, LEDs, HTTP
//! responder, clock) implement these traits.  The
//! [`BridgeService`](super::service::BridgeService) consumes them via
//! generics, so the loop never touches a driver directly and every
//! scenario can be replayed on the host with mocks.

use crate::error::{AcquisitionError, LinkError, SessionError};
use crate::payload::{DISCONNECTED, Payload};
use crate::telemetry::{InverterStatus, Reading};

// ───────────────────────────────────────────────────────────────
// Link port (WiFi station)
// ───────────────────────────────────────────────────────────────

/// Network link.  `begin` only starts an association attempt; completion
/// is observed through `is_connected`.
pub trait LinkPort {
    /// Start associating with the given credentials.  Returns immediately.
    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), LinkError>;

    /// Current association status.
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Session port (MQTT client)
// ───────────────────────────────────────────────────────────────

/// Last-will registered with the broker at connect time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastWill<'a> {
    pub topic: &'a str,
    pub payload: &'a str,
    pub qos: u8,
    pub retain: bool,
}

/// Everything a connect attempt needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions<'a> {
    pub client_id: &'a str,
    pub user: &'a str,
    pub password: &'a str,
    pub will: LastWill<'a>,
}

impl<'a> SessionOptions<'a> {
    /// Options with the disconnected last-will on `topic` (QoS 1, retained).
    pub fn new(client_id: &'a str, user: &'a str, password: &'a str, topic: &'a str) -> Self {
        Self {
            client_id,
            user,
            password,
            will: LastWill {
                topic,
                payload: DISCONNECTED,
                qos: 1,
                retain: true,
            },
        }
    }
}

/// Publish/subscribe broker session.
pub trait SessionPort {
    /// Bind the broker endpoint used by subsequent connects.
    fn set_server(&mut self, host: &str, port: u16);

    /// One connect attempt, registering the last-will.
    fn connect(&mut self, options: &SessionOptions<'_>) -> Result<(), SessionError>;

    fn is_connected(&self) -> bool;

    /// Publish `payload` on `topic`.
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SessionError>;

    /// Service keep-alives and inbound traffic.  Must not block.
    fn maintain(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Inverter port (serial data source)
// ───────────────────────────────────────────────────────────────

/// Data source.  One `poll` is one complete request/response exchange.
pub trait InverterPort {
    fn poll(&mut self) -> Result<Reading, AcquisitionError>;

    /// Status from the last successful poll, `None` before the first.
    fn last_status(&self) -> Option<InverterStatus>;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (status LEDs)
// ───────────────────────────────────────────────────────────────

/// The three discrete status lamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Blinks while the link is up.
    Alive,
    /// Toggles on every status poll during link recovery.
    LinkRecovery,
    /// Lit while the most recent acquisition failed.
    AcquisitionError,
}

pub trait IndicatorPort {
    fn set(&mut self, indicator: Indicator, on: bool);

    fn toggle(&mut self, indicator: Indicator);

    fn is_on(&self, indicator: Indicator) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Free-running millisecond counter plus a blocking delay.
pub trait ClockPort {
    /// Milliseconds since boot, wrapping at `u32::MAX`.
    fn now_ms(&self) -> u32;

    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// HTTP port (status responder)
// ───────────────────────────────────────────────────────────────

/// Local HTTP endpoint.  The loop hands it every new payload and gives it
/// a chance to answer pending requests once per tick.
pub trait HttpPort {
    fn set_status(&mut self, status: &Payload);

    /// Answer whatever is pending.  Must not block.
    fn service(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port
// ───────────────────────────────────────────────────────────────

/// The loop emits structured [`BridgeEvent`](super::events::BridgeEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::BridgeEvent);
}
