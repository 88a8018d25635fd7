//! Mock adapters for integration tests.
//!
//! Every mock records the calls made on it so tests can assert on the
//! full history without a radio, a broker, or a UART.

use std::cell::Cell;
use std::collections::VecDeque;

use growatt_bridge::adapters::http_server::StatusMirror;
use growatt_bridge::app::events::BridgeEvent;
use growatt_bridge::app::ports::{
    ClockPort, EventSink, HttpPort, Indicator, IndicatorPort, InverterPort, LinkPort,
    SessionOptions, SessionPort,
};
use growatt_bridge::app::service::{BridgeIo, BridgeService};
use growatt_bridge::config::BridgeConfig;
use growatt_bridge::error::{AcquisitionError, LinkError, SessionError};
use growatt_bridge::http::Method;
use growatt_bridge::payload::Payload;
use growatt_bridge::telemetry::{InverterStatus, Reading};

// ── Link ──────────────────────────────────────────────────────

/// Scripted WiFi station.
///
/// After `begin`, the first `polls_to_connect` status queries answer
/// `false`; the next one associates.  `drop_after` limits how many more
/// `true` answers are given before the link drops; it stays down until
/// the next `begin`.  The first `ignored_begins` calls to `begin` are
/// accepted but never associate, like a radio whose single attempt timed
/// out.
pub struct MockLink {
    connected: Cell<bool>,
    associating: Cell<bool>,
    remaining: Cell<u32>,
    polls_to_connect: u32,
    drop_after: Cell<Option<u32>>,
    ignored_begins: u32,
    pub begins: u32,
    pub queries: Cell<u32>,
}

#[allow(dead_code)]
impl MockLink {
    pub fn up() -> Self {
        let l = Self::down_then_up_after(0);
        l.connected.set(true);
        l
    }

    pub fn down_then_up_after(polls: u32) -> Self {
        Self {
            connected: Cell::new(false),
            associating: Cell::new(false),
            remaining: Cell::new(0),
            polls_to_connect: polls,
            drop_after: Cell::new(None),
            ignored_begins: 0,
            begins: 0,
            queries: Cell::new(0),
        }
    }

    /// Answer `true` only `n` more times.
    pub fn drop_after(self, n: u32) -> Self {
        self.drop_after.set(Some(n));
        self
    }

    /// Let the first `n` association attempts go unanswered.
    pub fn ignores_first_begins(mut self, n: u32) -> Self {
        self.ignored_begins = n;
        self
    }
}

impl LinkPort for MockLink {
    fn begin(&mut self, _ssid: &str, _password: &str) -> Result<(), LinkError> {
        self.begins += 1;
        self.associating.set(self.begins > self.ignored_begins);
        self.remaining.set(self.polls_to_connect);
        self.drop_after.set(None);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.queries.set(self.queries.get() + 1);
        if !self.connected.get() && self.associating.get() {
            if self.remaining.get() == 0 {
                self.connected.set(true);
                self.associating.set(false);
            } else {
                self.remaining.set(self.remaining.get() - 1);
            }
        }
        if self.connected.get() {
            match self.drop_after.get() {
                Some(0) => {
                    self.connected.set(false);
                    return false;
                }
                Some(n) => self.drop_after.set(Some(n - 1)),
                None => {}
            }
        }
        self.connected.get()
    }
}

// ── Session ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockSession {
    pub connected: bool,
    /// Number of upcoming connect attempts that fail.
    pub fail_connects: u32,
    pub fail_publish: bool,
    pub connect_attempts: u32,
    pub servers: Vec<(String, u16)>,
    pub wills: Vec<(String, String, u8, bool)>,
    pub published: Vec<(String, Vec<u8>, bool)>,
    pub maintain_calls: u32,
}

#[allow(dead_code)]
impl MockSession {
    pub fn last_payload(&self) -> Option<&str> {
        self.published
            .last()
            .and_then(|(_, p, _)| std::str::from_utf8(p).ok())
    }

    pub fn payloads(&self) -> Vec<String> {
        self.published
            .iter()
            .map(|(_, p, _)| String::from_utf8_lossy(p).into_owned())
            .collect()
    }
}

impl SessionPort for MockSession {
    fn set_server(&mut self, host: &str, port: u16) {
        self.servers.push((host.to_string(), port));
    }

    fn connect(&mut self, o: &SessionOptions<'_>) -> Result<(), SessionError> {
        self.connect_attempts += 1;
        self.wills.push((
            o.will.topic.to_string(),
            o.will.payload.to_string(),
            o.will.qos,
            o.will.retain,
        ));
        if self.fail_connects > 0 {
            self.fail_connects -= 1;
            return Err(SessionError::ConnectFailed);
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), SessionError> {
        if self.fail_publish {
            return Err(SessionError::PublishFailed);
        }
        self.published.push((topic.to_string(), payload.to_vec(), retain));
        Ok(())
    }

    fn maintain(&mut self) {
        self.maintain_calls += 1;
    }
}

// ── Inverter ──────────────────────────────────────────────────

pub fn demo_reading() -> Reading {
    Reading {
        status: InverterStatus::Normal,
        dc_voltage: 70.5,
        ac_frequency: 50.0,
        ac_voltage: 230.0,
        ac_power: 0.0,
        energy_today: 0.3,
        energy_total: 49.1,
        operating_time: 123_456,
        temperature: 21.1,
    }
}

/// Answers from a script; the demo reading once the script runs out.
#[derive(Default)]
pub struct MockInverter {
    pub script: VecDeque<Result<Reading, AcquisitionError>>,
    pub polls: u32,
    last: Option<InverterStatus>,
}

#[allow(dead_code)]
impl MockInverter {
    pub fn scripted(script: impl IntoIterator<Item = Result<Reading, AcquisitionError>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl InverterPort for MockInverter {
    fn poll(&mut self) -> Result<Reading, AcquisitionError> {
        self.polls += 1;
        let r = self.script.pop_front().unwrap_or_else(|| Ok(demo_reading()));
        if let Ok(reading) = &r {
            self.last = Some(reading.status);
        }
        r
    }

    fn last_status(&self) -> Option<InverterStatus> {
        self.last
    }
}

// ── LEDs ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockLeds {
    state: [bool; 3],
    pub history: Vec<(Indicator, bool)>,
    pub toggles: [u32; 3],
}

fn slot(i: Indicator) -> usize {
    match i {
        Indicator::Alive => 0,
        Indicator::LinkRecovery => 1,
        Indicator::AcquisitionError => 2,
    }
}

#[allow(dead_code)]
impl MockLeds {
    pub fn toggles_of(&self, i: Indicator) -> u32 {
        self.toggles[slot(i)]
    }
}

impl IndicatorPort for MockLeds {
    fn set(&mut self, i: Indicator, on: bool) {
        self.state[slot(i)] = on;
        self.history.push((i, on));
    }

    fn toggle(&mut self, i: Indicator) {
        self.toggles[slot(i)] += 1;
        let on = !self.state[slot(i)];
        self.state[slot(i)] = on;
        self.history.push((i, on));
    }

    fn is_on(&self, i: Indicator) -> bool {
        self.state[slot(i)]
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Manual clock; `delay_ms` advances it.
#[derive(Default)]
pub struct MockClock {
    pub now: u32,
    pub delays: Vec<u32>,
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> u32 {
        self.now
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
        self.now = self.now.wrapping_add(ms);
    }
}

// ── HTTP ──────────────────────────────────────────────────────

/// Real status mirror plus call counters.
pub struct MockHttp {
    pub mirror: StatusMirror,
    pub service_calls: u32,
    pub status_updates: u32,
}

#[allow(dead_code)]
impl MockHttp {
    pub fn new(update_path: &str) -> Self {
        Self {
            mirror: StatusMirror::new(update_path),
            service_calls: 0,
            status_updates: 0,
        }
    }

    /// Body of `GET /status`.
    pub fn get_status(&self) -> String {
        let (status, _, body) = self
            .mirror
            .handle(Method::Get, "/status")
            .expect("status route");
        assert_eq!(status, 200);
        String::from_utf8(body).expect("utf-8 payload")
    }
}

impl HttpPort for MockHttp {
    fn set_status(&mut self, status: &Payload) {
        self.status_updates += 1;
        self.mirror.set_status(status);
    }

    fn service(&mut self) {
        self.service_calls += 1;
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<BridgeEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&BridgeEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &BridgeEvent) {
        self.events.push(*event);
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type MockIo = BridgeIo<MockLink, MockSession, MockInverter, MockLeds, MockClock, MockHttp>;

pub fn test_config() -> BridgeConfig {
    BridgeConfig {
        wifi_ssid: "HomeWiFi".try_into().expect("ssid"),
        wifi_password: "mysecret8".try_into().expect("password"),
        ..BridgeConfig::default()
    }
}

/// A started service over the given link and inverter.
#[allow(dead_code)]
pub fn rig(link: MockLink, inverter: MockInverter) -> (BridgeService, MockIo, RecordingSink) {
    let config = test_config();
    let mut io = BridgeIo {
        link,
        session: MockSession::default(),
        inverter,
        leds: MockLeds::default(),
        clock: MockClock::default(),
        http: MockHttp::new(&config.update_path),
    };
    let mut sink = RecordingSink::default();
    let mut service = BridgeService::new(&config);
    service.start(&mut io, &mut sink);
    (service, io, sink)
}
