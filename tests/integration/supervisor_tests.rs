//! Link and session supervisors driven directly, outside the service.

use crate::mock_hw::{MockClock, MockLeds, MockLink, MockSession, RecordingSink, test_config};

use growatt_bridge::app::events::BridgeEvent;
use growatt_bridge::app::ports::{Indicator, IndicatorPort};
use growatt_bridge::config::BridgeConfig;
use growatt_bridge::error::{AcquisitionError, SessionError};
use growatt_bridge::payload::encode_outcome;
use growatt_bridge::supervisor::{ConnectivityState, LinkOutcome, LinkSupervisor, SessionSupervisor};

// ── Link ──────────────────────────────────────────────────────

#[test]
fn link_loss_restarts_association() {
    let config = test_config();
    let mut sup = LinkSupervisor::new(&config);
    let mut link = MockLink::up().drop_after(1);
    let mut leds = MockLeds::default();
    let mut clock = MockClock::default();
    let mut sink = RecordingSink::default();

    assert_eq!(
        sup.ensure_up(&mut link, &mut leds, &mut clock, &mut sink),
        LinkOutcome::Recovered
    );
    assert_eq!(
        sup.ensure_up(&mut link, &mut leds, &mut clock, &mut sink),
        LinkOutcome::Recovered
    );

    assert_eq!(link.begins, 1);
    assert_eq!(clock.delays, vec![200]);
    assert_eq!(
        sink.events,
        vec![
            BridgeEvent::LinkEstablished { polls: 0 },
            BridgeEvent::LinkLost,
            BridgeEvent::LinkRecovering,
            BridgeEvent::LinkEstablished { polls: 0 },
        ]
    );
    assert!(leds.history.contains(&(Indicator::Alive, false)));
}

#[test]
fn stable_link_reports_already_up() {
    let config = test_config();
    let mut sup = LinkSupervisor::new(&config);
    let mut link = MockLink::up();
    let mut leds = MockLeds::default();
    let mut clock = MockClock::default();
    let mut sink = RecordingSink::default();

    sup.ensure_up(&mut link, &mut leds, &mut clock, &mut sink);
    sink.events.clear();
    leds.history.clear();

    for _ in 0..10 {
        assert_eq!(
            sup.ensure_up(&mut link, &mut leds, &mut clock, &mut sink),
            LinkOutcome::AlreadyUp
        );
    }
    assert!(sink.events.is_empty());
    assert!(leds.history.is_empty());
    assert!(clock.delays.is_empty());
}

#[test]
fn recovery_lamp_blinks_once_per_poll() {
    let config = test_config();
    let mut sup = LinkSupervisor::new(&config);
    let mut link = MockLink::down_then_up_after(5);
    let mut leds = MockLeds::default();
    let mut clock = MockClock::default();
    let mut sink = RecordingSink::default();

    sup.ensure_up(&mut link, &mut leds, &mut clock, &mut sink);

    assert_eq!(leds.toggles_of(Indicator::LinkRecovery), 5);
    assert!(!leds.is_on(Indicator::LinkRecovery));
    assert_eq!(clock.now, 6 * 200);
    assert_eq!(sup.state(), ConnectivityState::Up);
}

#[test]
fn unanswered_association_is_started_again() {
    let config = BridgeConfig {
        link_retry_polls: 3,
        ..test_config()
    };
    let mut sup = LinkSupervisor::new(&config);
    let mut link = MockLink::down_then_up_after(2).ignores_first_begins(1);
    let mut leds = MockLeds::default();
    let mut clock = MockClock::default();
    let mut sink = RecordingSink::default();

    assert_eq!(
        sup.ensure_up(&mut link, &mut leds, &mut clock, &mut sink),
        LinkOutcome::Recovered
    );

    assert_eq!(link.begins, 2);
    assert_eq!(leds.toggles_of(Indicator::LinkRecovery), 5);
    assert_eq!(clock.delays, vec![200; 6]);
    assert_eq!(
        sink.events,
        vec![
            BridgeEvent::LinkRecovering,
            BridgeEvent::LinkRecovering,
            BridgeEvent::LinkEstablished { polls: 5 },
        ]
    );
}

// ── Session ───────────────────────────────────────────────────

#[test]
fn session_never_connects_without_link() {
    let config = test_config();
    let mut sup = SessionSupervisor::new(&config);
    let link = MockLink::down_then_up_after(0);
    let mut session = MockSession::default();
    let mut clock = MockClock::default();
    let mut sink = RecordingSink::default();

    for _ in 0..5 {
        assert_eq!(
            sup.ensure_up(&mut session, &link, &mut clock, &mut sink),
            ConnectivityState::Down
        );
    }
    assert_eq!(session.connect_attempts, 0);
    assert!(sink.events.is_empty());
}

#[test]
fn session_retries_until_broker_accepts() {
    let config = test_config();
    let mut sup = SessionSupervisor::new(&config);
    let link = MockLink::up();
    let mut session = MockSession {
        fail_connects: 2,
        ..MockSession::default()
    };
    let mut clock = MockClock::default();
    let mut sink = RecordingSink::default();

    assert_eq!(
        sup.ensure_up(&mut session, &link, &mut clock, &mut sink),
        ConnectivityState::Up
    );
    assert_eq!(session.connect_attempts, 3);
    assert_eq!(clock.delays, vec![5_000, 5_000]);
    assert_eq!(
        sink.events,
        vec![
            BridgeEvent::SessionRetry {
                attempt: 1,
                error: SessionError::ConnectFailed
            },
            BridgeEvent::SessionRetry {
                attempt: 2,
                error: SessionError::ConnectFailed
            },
            BridgeEvent::SessionOpened { attempts: 3 },
        ]
    );
}

#[test]
fn will_is_the_failure_payload() {
    let config = test_config();
    let sup = SessionSupervisor::new(&config);
    let failure = encode_outcome(Err(&AcquisitionError::NoResponse));

    let options = sup.options();
    assert_eq!(options.will.payload.as_bytes(), failure.as_bytes());
    assert_eq!(options.will.topic, config.mqtt_topic.as_str());
    assert_eq!(options.client_id, config.mqtt_client_id.as_str());
}
