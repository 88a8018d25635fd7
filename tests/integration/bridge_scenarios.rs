//! End-to-end scenarios for the scheduling loop.
//!
//! A started [`BridgeService`] is ticked against the mock adapters with a
//! manually advanced clock, and the test asserts on what reached the
//! broker, the HTTP mirror, and the LEDs.

use crate::mock_hw::{MockInverter, MockLink, demo_reading, rig};

use growatt_bridge::app::events::BridgeEvent;
use growatt_bridge::app::ports::{Indicator, IndicatorPort};
use growatt_bridge::app::service::CycleOutcome;
use growatt_bridge::error::AcquisitionError;
use growatt_bridge::payload::DISCONNECTED;
use growatt_bridge::supervisor::ConnectivityState;

fn reference_payload(cnt: u16) -> String {
    format!(
        r#"{{"Status": "Normal", "DcVoltage": 70.5, "AcFreq": 50.000, "AcVoltage": 230.0, "AcPower": 0.0, "EnergyToday": 0.3, "EnergyTotal": 49.1, "OperatingTime": 123456, "Temperature": 21.1, "Cnt": {cnt}}}"#
    )
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn start_seeds_mirror_with_disconnected_status() {
    let (service, io, sink) = rig(MockLink::up(), MockInverter::default());

    assert_eq!(io.http.get_status(), DISCONNECTED);
    assert!(service.current_payload().is_disconnected());
    assert_eq!(io.session.servers, vec![("mqtt.local".to_string(), 1883)]);
    assert_eq!(sink.events, vec![BridgeEvent::Started]);
}

#[test]
fn link_down_at_boot_recovers_then_opens_session() {
    let (mut service, mut io, mut sink) =
        rig(MockLink::down_then_up_after(3), MockInverter::default());

    let outcome = service.tick(&mut io, &mut sink);

    assert_eq!(outcome, CycleOutcome::NotDue);
    assert_eq!(io.link.begins, 1);
    assert_eq!(io.leds.toggles_of(Indicator::LinkRecovery), 3);
    assert!(!io.leds.is_on(Indicator::LinkRecovery), "lamp off once up");
    assert_eq!(io.clock.delays, vec![200; 4]);

    assert_eq!(service.link_state(), ConnectivityState::Up);
    assert!(sink.events.contains(&BridgeEvent::LinkEstablished { polls: 3 }));

    // Broker re-bound after recovery, then exactly one connect attempt.
    assert_eq!(io.session.servers.len(), 2);
    assert_eq!(io.session.connect_attempts, 1);
    assert_eq!(service.session_state(), ConnectivityState::Up);
}

// ── Acquisition cycles ────────────────────────────────────────

#[test]
fn failures_publish_disconnected_and_keep_the_counter() {
    let inverter = MockInverter::scripted([
        Ok(demo_reading()),
        Err(AcquisitionError::NoResponse),
        Err(AcquisitionError::BadChecksum),
        Ok(demo_reading()),
    ]);
    let (mut service, mut io, mut sink) = rig(MockLink::up(), inverter);
    service.tick(&mut io, &mut sink);

    let mut outcomes = Vec::new();
    let mut error_lamp = Vec::new();
    for cycle in 1..=4 {
        io.clock.now = cycle * 10_000;
        outcomes.push(service.tick(&mut io, &mut sink));
        error_lamp.push(io.leds.is_on(Indicator::AcquisitionError));
    }

    assert_eq!(
        outcomes,
        vec![
            CycleOutcome::Published(1),
            CycleOutcome::Failed,
            CycleOutcome::Failed,
            CycleOutcome::Published(2),
        ]
    );
    assert_eq!(
        io.session.payloads(),
        vec![
            reference_payload(1),
            DISCONNECTED.to_string(),
            DISCONNECTED.to_string(),
            reference_payload(2),
        ]
    );
    assert_eq!(error_lamp, vec![false, true, true, false]);
    assert_eq!(service.acquirer().failures(), 2);
    assert!(io.session.published.iter().all(|(topic, _, retain)| {
        topic == "solar/growatt" && *retain
    }));
}

#[test]
fn status_endpoint_is_stable_between_cycles() {
    let (mut service, mut io, mut sink) = rig(MockLink::up(), MockInverter::default());
    service.tick(&mut io, &mut sink);

    io.clock.now = 10_000;
    assert_eq!(service.tick(&mut io, &mut sink), CycleOutcome::Published(1));
    let after_cycle = io.http.get_status();
    let updates = io.http.status_updates;

    for now in [10_500, 12_000, 19_999] {
        io.clock.now = now;
        assert_eq!(service.tick(&mut io, &mut sink), CycleOutcome::NotDue);
        assert_eq!(io.http.get_status(), after_cycle);
    }

    assert_eq!(io.http.status_updates, updates);
    assert_eq!(Some(after_cycle.as_str()), io.session.last_payload());
    assert_eq!(service.current_payload().as_str(), after_cycle);
}

#[test]
fn mirror_is_updated_even_when_publish_fails() {
    let (mut service, mut io, mut sink) = rig(MockLink::up(), MockInverter::default());
    service.tick(&mut io, &mut sink);
    io.session.fail_publish = true;

    io.clock.now = 10_000;
    service.tick(&mut io, &mut sink);

    assert_eq!(io.http.get_status(), reference_payload(1));
    assert_eq!(service.publisher().failed(), 1);
    assert_eq!(
        sink.count(|e| matches!(e, BridgeEvent::Published { .. })),
        0
    );
}

// ── Steady state ──────────────────────────────────────────────

#[test]
fn healthy_loop_never_reconnects() {
    let (mut service, mut io, mut sink) = rig(MockLink::up(), MockInverter::default());

    for step in 0..50 {
        io.clock.now = step * 1_000;
        service.tick(&mut io, &mut sink);
    }

    assert_eq!(io.link.begins, 0);
    assert_eq!(io.session.connect_attempts, 1);
    assert!(io.clock.delays.is_empty(), "nothing blocks when healthy");
    assert_eq!(io.http.service_calls, 50);
    assert_eq!(io.session.maintain_calls, 50);
    assert_eq!(service.tick_count(), 50);
    // Fires at 10 s, 20 s, 30 s and 40 s.
    assert_eq!(io.inverter.polls, 4);
}

#[test]
fn alive_lamp_toggles_on_its_period() {
    let (mut service, mut io, mut sink) = rig(MockLink::up(), MockInverter::default());
    service.tick(&mut io, &mut sink);
    assert!(!io.leds.is_on(Indicator::Alive));

    io.clock.now = 500;
    service.tick(&mut io, &mut sink);
    assert!(io.leds.is_on(Indicator::Alive));

    io.clock.now = 999;
    service.tick(&mut io, &mut sink);
    assert!(io.leds.is_on(Indicator::Alive), "not due yet");

    io.clock.now = 1_000;
    service.tick(&mut io, &mut sink);
    assert!(!io.leds.is_on(Indicator::Alive));
    assert_eq!(io.leds.toggles_of(Indicator::Alive), 2);
}

// ── Session gating ────────────────────────────────────────────

#[test]
fn acquisition_is_skipped_while_session_is_down() {
    // Link survives one check plus two connect attempts, then drops.
    let (mut service, mut io, mut sink) =
        rig(MockLink::up().drop_after(3), MockInverter::default());
    io.session.fail_connects = u32::MAX;
    io.clock.now = 10_000;

    let outcome = service.tick(&mut io, &mut sink);

    assert_eq!(outcome, CycleOutcome::Skipped);
    assert_eq!(io.inverter.polls, 0);
    assert!(io.session.published.is_empty());
    assert_eq!(io.session.connect_attempts, 2);
    assert_eq!(io.clock.delays, vec![5_000, 5_000]);
    assert!(sink.events.contains(&BridgeEvent::SessionAbandoned));
    assert_eq!(service.session_state(), ConnectivityState::Down);
    assert!(!io.leds.is_on(Indicator::Alive), "lamp forced off without link");
}

#[test]
fn every_connect_registers_the_disconnected_will() {
    let (mut service, mut io, mut sink) = rig(MockLink::up(), MockInverter::scripted([Err(
        AcquisitionError::NoResponse,
    )]));
    io.session.fail_connects = 2;
    service.tick(&mut io, &mut sink);

    assert_eq!(io.session.connect_attempts, 3);
    for (topic, payload, qos, retain) in &io.session.wills {
        assert_eq!(topic, "solar/growatt");
        assert_eq!(payload, DISCONNECTED);
        assert_eq!(*qos, 1);
        assert!(*retain);
    }

    // The failure payload is byte-identical to the will.
    io.clock.now = 10_000;
    assert_eq!(service.tick(&mut io, &mut sink), CycleOutcome::Failed);
    let (_, will, _, _) = &io.session.wills[0];
    assert_eq!(io.session.last_payload(), Some(will.as_str()));
}
