//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the scheduling loop
//! against mock adapters.  All tests run on the host (x86_64) with no
//! radio, broker, or inverter required.

mod bridge_scenarios;
mod mock_hw;
mod supervisor_tests;
