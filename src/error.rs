//! Unified error types for the bridge firmware.
//!
//! One small `Copy` enum per failure domain, plus an umbrella [`Error`]
//! that each of them converts into.  None of these is ever fatal to the
//! scheduling loop: supervisors retry, acquisition failures become a
//! published status, and publish failures are only logged.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Link(LinkError),
    Session(SessionError),
    Acquisition(AcquisitionError),
    Config(ConfigError),
    Update(UpdateError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Session(e) => write!(f, "session: {e}"),
            Self::Acquisition(e) => write!(f, "acquisition: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Update(e) => write!(f, "update: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Link (WiFi station) errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The driver refused the station configuration.
    ConfigRejected,
    /// Starting the association attempt failed.
    StartFailed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigRejected => write!(f, "station configuration rejected"),
            Self::StartFailed => write!(f, "association start failed"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Session (MQTT) errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// No broker host/port bound yet.
    NoServer,
    /// Broker unreachable, refused us, or the handshake timed out.
    ConnectFailed,
    /// Publish was not accepted by the client (not connected, buffer full).
    PublishFailed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoServer => write!(f, "no broker configured"),
            Self::ConnectFailed => write!(f, "broker connect failed"),
            Self::PublishFailed => write!(f, "publish failed"),
        }
    }
}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Acquisition (inverter) errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionError {
    /// The device did not answer within the serial turnaround time.
    NoResponse,
    /// Reply failed the CRC check.
    BadChecksum,
    /// Reply was truncated or structurally wrong.
    Malformed,
    /// Device answered with a Modbus exception code.
    DeviceException(u8),
    /// Serial transport error.
    Transport,
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoResponse => write!(f, "device did not respond"),
            Self::BadChecksum => write!(f, "reply checksum mismatch"),
            Self::Malformed => write!(f, "malformed reply"),
            Self::DeviceException(code) => write!(f, "device exception 0x{code:02x}"),
            Self::Transport => write!(f, "serial transport error"),
        }
    }
}

impl From<AcquisitionError> for Error {
    fn from(e: AcquisitionError) -> Self {
        Self::Acquisition(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// A config field failed validation.  The string names the field and rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigError(pub &'static str);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.0)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Firmware update errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateError {
    AlreadyInProgress,
    InvalidSize,
    NotReceiving,
    NonSequential,
    Overflow,
    IncompleteTransfer,
    BeginFailed,
    WriteFailed,
    VerifyFailed,
    BootSetFailed,
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInProgress => write!(f, "update already in progress"),
            Self::InvalidSize => write!(f, "image size out of range (max 4 MB)"),
            Self::NotReceiving => write!(f, "no update in progress"),
            Self::NonSequential => write!(f, "chunk offset does not match bytes written"),
            Self::Overflow => write!(f, "chunk would exceed declared image size"),
            Self::IncompleteTransfer => write!(f, "finalize called before all bytes written"),
            Self::BeginFailed => write!(f, "update begin failed"),
            Self::WriteFailed => write!(f, "update write failed"),
            Self::VerifyFailed => write!(f, "image verification failed"),
            Self::BootSetFailed => write!(f, "set boot partition failed"),
        }
    }
}

impl From<UpdateError> for Error {
    fn from(e: UpdateError) -> Self {
        Self::Update(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
