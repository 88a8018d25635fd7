//! MQTT session supervisor.
//!
//! Connect attempts only happen while the link is up.  A failed attempt
//! sleeps `session_retry_ms` and tries again, indefinitely, but the retry
//! loop is left as soon as the link drops: there is no point holding the
//! scheduler for a broker that cannot be reached.

use log::debug;

use super::ConnectivityState;
use crate::app::events::BridgeEvent;
use crate::app::ports::{ClockPort, EventSink, LinkPort, SessionOptions, SessionPort};
use crate::config::{BridgeConfig, Text};

pub struct SessionSupervisor {
    state: ConnectivityState,
    host: Text<64>,
    port: u16,
    client_id: Text<32>,
    user: Text<32>,
    password: Text<64>,
    topic: Text<64>,
    retry_ms: u32,
    /// Connect attempts in the current recovery.
    attempts: u32,
}

impl SessionSupervisor {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            state: ConnectivityState::Down,
            host: config.mqtt_host.clone(),
            port: config.mqtt_port,
            client_id: config.mqtt_client_id.clone(),
            user: config.mqtt_user.clone(),
            password: config.mqtt_password.clone(),
            topic: config.mqtt_topic.clone(),
            retry_ms: config.session_retry_ms,
            attempts: 0,
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Connect options, including the disconnected last-will on the
    /// telemetry topic.
    pub fn options(&self) -> SessionOptions<'_> {
        SessionOptions::new(&self.client_id, &self.user, &self.password, &self.topic)
    }

    /// Point the client at the configured broker.
    pub fn bind(&self, session: &mut impl SessionPort) {
        debug!("Session: binding broker {}:{}", self.host, self.port);
        session.set_server(&self.host, self.port);
    }

    /// At most one connect attempt.  Never sleeps.
    pub fn step(
        &mut self,
        session: &mut impl SessionPort,
        link: &impl LinkPort,
        sink: &mut impl EventSink,
    ) -> ConnectivityState {
        if session.is_connected() {
            if self.state != ConnectivityState::Up {
                self.opened(sink);
            }
            return self.state;
        }
        if !link.is_connected() {
            if self.state == ConnectivityState::Recovering {
                sink.emit(&BridgeEvent::SessionAbandoned);
            }
            self.state = ConnectivityState::Down;
            self.attempts = 0;
            return self.state;
        }

        self.attempts = self.attempts.saturating_add(1);
        let options = self.options();
        match session.connect(&options) {
            Ok(()) => self.opened(sink),
            Err(error) => {
                sink.emit(&BridgeEvent::SessionRetry {
                    attempt: self.attempts,
                    error,
                });
                self.state = ConnectivityState::Recovering;
            }
        }
        self.state
    }

    fn opened(&mut self, sink: &mut impl EventSink) {
        sink.emit(&BridgeEvent::SessionOpened {
            attempts: self.attempts,
        });
        self.state = ConnectivityState::Up;
        self.attempts = 0;
    }

    /// Block until the session is up or the link is gone.
    ///
    /// Returns [`ConnectivityState::Up`] or [`ConnectivityState::Down`].
    pub fn ensure_up(
        &mut self,
        session: &mut impl SessionPort,
        link: &impl LinkPort,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> ConnectivityState {
        loop {
            match self.step(session, link, sink) {
                ConnectivityState::Recovering => clock.delay_ms(self.retry_ms),
                settled => return settled,
            }
        }
    }
}
