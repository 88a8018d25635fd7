//! Status payload rendering.
//!
//! Every acquisition cycle produces exactly one immutable [`Payload`]:
//! either the full reading set or the single-field disconnected status.
//! The same disconnected bytes are registered as the MQTT last-will, so
//! a dropped session and a failed poll look identical to subscribers.
//!
//! Field order and precision are fixed:
//!
//! ```text
//! {"Status": "Normal", "DcVoltage": 70.5, "AcFreq": 50.000, "AcVoltage": 230.0,
//!  "AcPower": 0.0, "EnergyToday": 0.3, "EnergyTotal": 49.1,
//!  "OperatingTime": 123456, "Temperature": 21.1, "Cnt": 42}
//! ```

use core::fmt::{self, Write};

use log::warn;

use crate::error::AcquisitionError;
use crate::telemetry::TelemetrySnapshot;

/// Upper bound on the rendered size; a payload with every float at
/// `f32::MAX` still fits.
pub const PAYLOAD_CAPACITY: usize = 640;

/// Body published on failure and registered as last-will.
pub const DISCONNECTED: &str = r#"{"Status": "Disconnected" }"#;

/// A rendered status document.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload(heapless::String<PAYLOAD_CAPACITY>);

impl Payload {
    /// The fixed disconnected status.
    pub fn disconnected() -> Self {
        let mut s = heapless::String::new();
        // DISCONNECTED is far below capacity.
        let _ = s.push_str(DISCONNECTED);
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_disconnected(&self) -> bool {
        self.0 == DISCONNECTED
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::disconnected()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({})", self.as_str())
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-finite values would make the document invalid JSON.
fn finite(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

fn render(out: &mut heapless::String<PAYLOAD_CAPACITY>, snap: &TelemetrySnapshot) -> fmt::Result {
    let r = &snap.reading;
    write!(out, r#"{{"Status": "{}", "#, r.status.as_str())?;
    write!(out, r#""DcVoltage": {:.1}, "#, finite(r.dc_voltage))?;
    write!(out, r#""AcFreq": {:.3}, "#, finite(r.ac_frequency))?;
    write!(out, r#""AcVoltage": {:.1}, "#, finite(r.ac_voltage))?;
    write!(out, r#""AcPower": {:.1}, "#, finite(r.ac_power))?;
    write!(out, r#""EnergyToday": {:.1}, "#, finite(r.energy_today))?;
    write!(out, r#""EnergyTotal": {:.1}, "#, finite(r.energy_total))?;
    write!(out, r#""OperatingTime": {}, "#, r.operating_time)?;
    write!(out, r#""Temperature": {:.1}, "#, finite(r.temperature))?;
    write!(out, r#""Cnt": {}}}"#, snap.sequence)
}

/// Render a successful acquisition.
pub fn encode(snapshot: &TelemetrySnapshot) -> Payload {
    let mut out = heapless::String::new();
    if render(&mut out, snapshot).is_err() {
        warn!("Payload exceeded {} bytes, publishing disconnected", PAYLOAD_CAPACITY);
        return Payload::disconnected();
    }
    Payload(out)
}

/// Render the outcome of one acquisition cycle.
pub fn encode_outcome(outcome: Result<&TelemetrySnapshot, &AcquisitionError>) -> Payload {
    match outcome {
        Ok(snapshot) => encode(snapshot),
        Err(_) => Payload::disconnected(),
    }
}
