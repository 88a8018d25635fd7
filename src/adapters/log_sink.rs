//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured bridge events to the
//! ESP-IDF logger (UART console in production).

use log::{info, warn};

use crate::app::events::BridgeEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`BridgeEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &BridgeEvent) {
        match event {
            BridgeEvent::Started => info!("START | bridge loop running"),
            BridgeEvent::LinkLost => warn!("LINK  | down, reconnecting"),
            BridgeEvent::LinkRecovering => info!("LINK  | association started"),
            BridgeEvent::LinkEstablished { polls } => {
                info!("LINK  | up after {} status polls", polls);
            }
            BridgeEvent::SessionOpened { attempts } => {
                info!("SESSION | connected (attempts={})", attempts);
            }
            BridgeEvent::SessionRetry { attempt, error } => {
                warn!("SESSION | connect #{} failed: {}", attempt, error);
            }
            BridgeEvent::SessionAbandoned => warn!("SESSION | link lost while retrying"),
            BridgeEvent::Acquired { sequence } => info!("ACQ   | reading #{}", sequence),
            BridgeEvent::AcquisitionFailed(e) => warn!("ACQ   | failed: {}", e),
            BridgeEvent::Published { sequence: Some(seq) } => {
                info!("PUB   | telemetry #{}", seq);
            }
            BridgeEvent::Published { sequence: None } => info!("PUB   | disconnected status"),
        }
    }
}
