//! Outbound bridge events.
//!
//! The [`BridgeService`](super::service::BridgeService) and the
//! supervisors emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters decide where they go; the firmware logs them.

use crate::error::{AcquisitionError, SessionError};

/// Structured events emitted by the scheduling loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BridgeEvent {
    /// The service has started.
    Started,

    /// The link was found down; an association attempt follows.
    LinkLost,

    /// An association attempt was started.
    LinkRecovering,

    /// The link came up after `polls` status polls.
    LinkEstablished { polls: u32 },

    /// A broker session was opened after `attempts` connect attempts.
    SessionOpened { attempts: u32 },

    /// A connect attempt failed; the loop sleeps before the next one.
    SessionRetry { attempt: u32, error: SessionError },

    /// The link dropped while retrying; the session is abandoned for this tick.
    SessionAbandoned,

    /// A reading was acquired under this sequence number.
    Acquired { sequence: u16 },

    /// Acquisition failed; the disconnected status was published.
    AcquisitionFailed(AcquisitionError),

    /// A payload was handed to the session.
    Published { sequence: Option<u16> },
}
