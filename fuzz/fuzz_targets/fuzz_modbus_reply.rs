//! Fuzz target: `decode_reply` (Modbus-RTU input-register reply)
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - A decoded reading always carries a documented status and renders to
//!   a non-disconnected payload
//!
//! cargo fuzz run fuzz_modbus_reply

#![no_main]

use growatt_bridge::adapters::inverter::decode_reply;
use growatt_bridge::payload::encode;
use growatt_bridge::telemetry::TelemetrySnapshot;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&address, frame)) = data.split_first() else {
        return;
    };

    if let Ok(reading) = decode_reply(address, frame) {
        assert_eq!(frame[0], address, "accepted a reply from another slave");
        let payload = encode(&TelemetrySnapshot { reading, sequence: 1 });
        assert!(!payload.is_disconnected());
    }
});
