//! Best-effort retained publish of the status payload.

use log::warn;

use crate::app::ports::SessionPort;
use crate::config::Text;
use crate::error::SessionError;
use crate::payload::Payload;

pub struct Publisher {
    topic: Text<64>,
    published: u32,
    failed: u32,
}

impl Publisher {
    pub fn new(topic: &Text<64>) -> Self {
        Self {
            topic: topic.clone(),
            published: 0,
            failed: 0,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Retained publish.  A failure is logged and otherwise ignored; the
    /// next cycle publishes a fresh payload anyway.
    pub fn publish(
        &mut self,
        session: &mut impl SessionPort,
        payload: &Payload,
    ) -> Result<(), SessionError> {
        match session.publish(&self.topic, payload.as_bytes(), true) {
            Ok(()) => {
                self.published = self.published.wrapping_add(1);
                Ok(())
            }
            Err(e) => {
                self.failed = self.failed.wrapping_add(1);
                warn!("Publish to '{}' failed: {}", self.topic, e);
                Err(e)
            }
        }
    }

    pub fn published(&self) -> u32 {
        self.published
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }
}
