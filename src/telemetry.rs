//! Inverter readings and the acquisition bookkeeping around them.
//!
//! [`Acquirer`] owns the sequence counter and the latest
//! [`TelemetrySnapshot`].  A snapshot is only ever replaced whole, so
//! the encoder never observes a half-updated reading.

use core::fmt;

use log::{debug, warn};
use serde::Serialize;

use crate::app::ports::InverterPort;
use crate::error::AcquisitionError;

/// Operating status reported by the inverter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InverterStatus {
    Waiting,
    Normal,
    Fault,
}

impl InverterStatus {
    /// Map the raw status register.  Codes outside the documented set
    /// are a protocol error, not a fourth status.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Waiting),
            1 => Some(Self::Normal),
            3 => Some(Self::Fault),
            _ => None,
        }
    }

    /// Literal used in the wire payload.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Normal => "Normal",
            Self::Fault => "Fault",
        }
    }
}

impl fmt::Display for InverterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One complete set of measurements from a successful poll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub status: InverterStatus,
    /// PV input voltage (V).
    pub dc_voltage: f32,
    /// Grid frequency (Hz).
    pub ac_frequency: f32,
    /// Grid voltage (V).
    pub ac_voltage: f32,
    /// Output power (W).
    pub ac_power: f32,
    /// Energy fed in today (kWh).
    pub energy_today: f32,
    /// Lifetime energy (kWh).
    pub energy_total: f32,
    /// Lifetime operating time (s).
    pub operating_time: u32,
    /// Inverter temperature (°C).
    pub temperature: f32,
}

/// A reading tagged with the sequence number it was published under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    pub reading: Reading,
    /// Successful-acquisition counter; wraps at `u16::MAX`.
    pub sequence: u16,
}

/// Owns the sequence counter and the latest snapshot.
#[derive(Debug, Default)]
pub struct Acquirer {
    sequence: u16,
    latest: Option<TelemetrySnapshot>,
    failures: u32,
}

impl Acquirer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Poll the inverter once.
    ///
    /// On success the counter advances and a fresh snapshot replaces the
    /// previous one.  On failure neither changes; the caller publishes the
    /// disconnected status instead.
    pub fn acquire(
        &mut self,
        inverter: &mut impl InverterPort,
    ) -> Result<TelemetrySnapshot, AcquisitionError> {
        match inverter.poll() {
            Ok(reading) => {
                self.sequence = self.sequence.wrapping_add(1);
                let snapshot = TelemetrySnapshot {
                    reading,
                    sequence: self.sequence,
                };
                self.latest = Some(snapshot);
                debug!("Acquired #{} status={}", self.sequence, reading.status);
                Ok(snapshot)
            }
            Err(e) => {
                self.failures = self.failures.wrapping_add(1);
                warn!("Acquisition failed: {} (failures={})", e, self.failures);
                Err(e)
            }
        }
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    pub fn latest(&self) -> Option<&TelemetrySnapshot> {
        self.latest.as_ref()
    }

    /// Failed polls since boot.
    pub fn failures(&self) -> u32 {
        self.failures
    }
}
