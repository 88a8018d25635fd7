//! Application core: the scheduling loop and its port boundary.
//!
//! The loop's rules live here and in [`crate::supervisor`].  All
//! interaction with the radio, the broker, the inverter and the lamps
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
