//! WiFi link supervisor.
//!
//! Recovery has no retry limit and no backoff: once an association attempt
//! is started the status is polled every `link_poll_interval_ms` until it
//! reports connected, toggling the recovery lamp on every poll.  The radio
//! makes a single attempt per `begin`, so after `link_retry_polls`
//! unanswered polls the attempt is started again.

use log::{debug, info, warn};

use super::ConnectivityState;
use crate::app::events::BridgeEvent;
use crate::app::ports::{ClockPort, EventSink, Indicator, IndicatorPort, LinkPort};
use crate::config::{BridgeConfig, Text};

/// Result of [`LinkSupervisor::ensure_up`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The link was already up; nothing but the status query happened.
    AlreadyUp,
    /// The link went through recovery; dependants must re-bind.
    Recovered,
}

pub struct LinkSupervisor {
    state: ConnectivityState,
    ssid: Text<32>,
    password: Text<64>,
    poll_interval_ms: u32,
    retry_polls: u32,
    /// Status polls since recovery started.
    polls: u32,
    /// Status polls since the last `begin`.
    attempt_polls: u32,
}

impl LinkSupervisor {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            state: ConnectivityState::Down,
            ssid: config.wifi_ssid.clone(),
            password: config.wifi_password.clone(),
            poll_interval_ms: config.link_poll_interval_ms,
            retry_polls: config.link_retry_polls.max(1),
            polls: 0,
            attempt_polls: 0,
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// One transition.  Never sleeps.
    pub fn step(
        &mut self,
        link: &mut impl LinkPort,
        leds: &mut impl IndicatorPort,
        sink: &mut impl EventSink,
    ) -> ConnectivityState {
        if link.is_connected() {
            if self.state != ConnectivityState::Up {
                leds.set(Indicator::LinkRecovery, false);
                sink.emit(&BridgeEvent::LinkEstablished { polls: self.polls });
                self.state = ConnectivityState::Up;
                self.polls = 0;
            }
            return self.state;
        }

        match self.state {
            ConnectivityState::Down | ConnectivityState::Up => {
                if self.state == ConnectivityState::Up {
                    sink.emit(&BridgeEvent::LinkLost);
                }
                leds.set(Indicator::Alive, false);
                self.polls = 0;
                self.start_attempt(link, sink);
            }
            ConnectivityState::Recovering => {
                leds.toggle(Indicator::LinkRecovery);
                self.polls = self.polls.saturating_add(1);
                self.attempt_polls += 1;
                debug!("Link: waiting for association (poll {})", self.polls);
                if self.attempt_polls >= self.retry_polls {
                    info!(
                        "Link: no association after {} polls, starting a new attempt",
                        self.attempt_polls
                    );
                    self.start_attempt(link, sink);
                }
            }
        }
        self.state
    }

    /// `begin` once.  A refused start leaves the state `Down`, so the next
    /// step tries again.
    fn start_attempt(&mut self, link: &mut impl LinkPort, sink: &mut impl EventSink) {
        self.attempt_polls = 0;
        match link.begin(&self.ssid, &self.password) {
            Ok(()) => {
                self.state = ConnectivityState::Recovering;
                sink.emit(&BridgeEvent::LinkRecovering);
            }
            Err(e) => {
                warn!("Link: association start failed: {}", e);
                self.state = ConnectivityState::Down;
            }
        }
    }

    /// Block until the link is up.
    pub fn ensure_up(
        &mut self,
        link: &mut impl LinkPort,
        leds: &mut impl IndicatorPort,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> LinkOutcome {
        let entry = self.state;
        let mut state = self.step(link, leds, sink);
        if state == ConnectivityState::Up && entry == ConnectivityState::Up {
            return LinkOutcome::AlreadyUp;
        }
        while state != ConnectivityState::Up {
            clock.delay_ms(self.poll_interval_ms);
            state = self.step(link, leds, sink);
        }
        LinkOutcome::Recovered
    }
}
