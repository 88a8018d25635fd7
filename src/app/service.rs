//! Bridge service: the cooperative scheduling loop.
//!
//! [`BridgeService`] owns both supervisors, the two periodic timers, the
//! acquisition bookkeeping, and the current payload.  All I/O flows through
//! the port bundle [`BridgeIo`] handed in on every tick, so the whole loop
//! runs against mocks on the host.
//!
//! ```text
//!  tick:  LinkCheck ─▶ SessionCheck ─▶ ServiceHTTP ─▶ ServiceBus
//!                                                        │
//!         Idle ◀── {AcquirePublish?} ◀── {AliveToggle?} ◀┘
//! ```

use log::{debug, info};

use crate::config::BridgeConfig;
use crate::payload::{self, Payload};
use crate::publisher::Publisher;
use crate::scheduler::PeriodicTimer;
use crate::supervisor::{ConnectivityState, LinkOutcome, LinkSupervisor, SessionSupervisor};
use crate::telemetry::Acquirer;

use super::events::BridgeEvent;
use super::ports::{
    ClockPort, EventSink, HttpPort, Indicator, IndicatorPort, InverterPort, LinkPort, SessionPort,
};

// ───────────────────────────────────────────────────────────────
// Port bundle
// ───────────────────────────────────────────────────────────────

/// Every adapter the loop talks to.
pub struct BridgeIo<L, S, I, D, C, H> {
    pub link: L,
    pub session: S,
    pub inverter: I,
    pub leds: D,
    pub clock: C,
    pub http: H,
}

/// What the acquisition step did this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The acquisition timer was not due.
    NotDue,
    /// Due, but link or session was down; the timer still advanced.
    Skipped,
    /// A reading was published under this sequence number.
    Published(u16),
    /// The inverter did not deliver; the disconnected status was published.
    Failed,
}

// ───────────────────────────────────────────────────────────────
// BridgeService
// ───────────────────────────────────────────────────────────────

pub struct BridgeService {
    link: LinkSupervisor,
    session: SessionSupervisor,
    alive: PeriodicTimer,
    poll: PeriodicTimer,
    acquirer: Acquirer,
    publisher: Publisher,
    current: Payload,
    tick_count: u64,
}

impl BridgeService {
    /// Construct from a validated configuration.
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            link: LinkSupervisor::new(config),
            session: SessionSupervisor::new(config),
            alive: PeriodicTimer::new("alive", config.alive_period_ms),
            poll: PeriodicTimer::new("acquire", config.poll_period_ms),
            acquirer: Acquirer::new(),
            publisher: Publisher::new(&config.mqtt_topic),
            current: Payload::disconnected(),
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bind the broker and seed the HTTP mirror with the disconnected
    /// status.  Call once before the first tick.
    pub fn start<L, S, I, D, C, H>(
        &mut self,
        io: &mut BridgeIo<L, S, I, D, C, H>,
        sink: &mut impl EventSink,
    ) where
        S: SessionPort,
        H: HttpPort,
    {
        self.session.bind(&mut io.session);
        io.http.set_status(&self.current);
        sink.emit(&BridgeEvent::Started);
        info!("Bridge service started, publishing to '{}'", self.publisher.topic());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One pass of the scheduling loop.
    ///
    /// Only link recovery and the session retry sleep may block.
    pub fn tick<L, S, I, D, C, H>(
        &mut self,
        io: &mut BridgeIo<L, S, I, D, C, H>,
        sink: &mut impl EventSink,
    ) -> CycleOutcome
    where
        L: LinkPort,
        S: SessionPort,
        I: InverterPort,
        D: IndicatorPort,
        C: ClockPort,
        H: HttpPort,
    {
        self.tick_count += 1;
        let now = io.clock.now_ms();

        // 1. Link
        if self.link.ensure_up(&mut io.link, &mut io.leds, &mut io.clock, sink)
            == LinkOutcome::Recovered
        {
            self.session.bind(&mut io.session);
        }

        // 2. Session
        self.session
            .ensure_up(&mut io.session, &io.link, &mut io.clock, sink);

        // 3. Pending HTTP requests, 4. bus I/O
        io.http.service();
        io.session.maintain();

        // 5. Alive lamp
        if self.alive.poll(now) {
            if io.link.is_connected() {
                io.leds.toggle(Indicator::Alive);
            } else {
                io.leds.set(Indicator::Alive, false);
            }
        }

        // 6. Acquisition
        if !self.poll.poll(now) {
            return CycleOutcome::NotDue;
        }
        if !(io.session.is_connected() && io.link.is_connected()) {
            return CycleOutcome::Skipped;
        }
        self.acquire_and_publish(io, sink)
    }

    /// Poll → encode → push → indicator.  The HTTP mirror and the bus
    /// always receive the same payload.
    fn acquire_and_publish<L, S, I, D, C, H>(
        &mut self,
        io: &mut BridgeIo<L, S, I, D, C, H>,
        sink: &mut impl EventSink,
    ) -> CycleOutcome
    where
        S: SessionPort,
        I: InverterPort,
        D: IndicatorPort,
        H: HttpPort,
    {
        let outcome = self.acquirer.acquire(&mut io.inverter);
        self.current = payload::encode_outcome(outcome.as_ref());

        let sequence = match outcome {
            Ok(snapshot) => {
                sink.emit(&BridgeEvent::Acquired {
                    sequence: snapshot.sequence,
                });
                Some(snapshot.sequence)
            }
            Err(e) => {
                if let Some(status) = io.inverter.last_status() {
                    debug!("Inverter last reported '{}'", status);
                }
                sink.emit(&BridgeEvent::AcquisitionFailed(e));
                None
            }
        };

        if self.publisher.publish(&mut io.session, &self.current).is_ok() {
            sink.emit(&BridgeEvent::Published { sequence });
        }
        io.http.set_status(&self.current);
        io.leds.set(Indicator::AcquisitionError, sequence.is_none());

        match sequence {
            Some(seq) => CycleOutcome::Published(seq),
            None => CycleOutcome::Failed,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// The payload most recently handed to both publish paths.
    pub fn current_payload(&self) -> &Payload {
        &self.current
    }

    pub fn link_state(&self) -> ConnectivityState {
        self.link.state()
    }

    pub fn session_state(&self) -> ConnectivityState {
        self.session.state()
    }

    pub fn acquirer(&self) -> &Acquirer {
        &self.acquirer
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
