//! Low-level peripheral drivers.

pub mod status_led;
