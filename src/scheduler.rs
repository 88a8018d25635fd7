//! Timer gate for the cooperative scheduling loop.
//!
//! The loop samples a free-running millisecond counter once per tick and
//! asks each [`PeriodicTimer`] whether its action is due.  Counters are
//! `u32` and wrap after ~49.7 days of uptime, so elapsed time is always
//! computed with wrapping subtraction:
//!
//! ```text
//!   now = 0x0000_0100, last = 0xFFFF_FF00
//!   now.wrapping_sub(last) = 0x200   (512 ms, not a negative number)
//! ```
//!
//! A `now < last` comparison would stall the gate for a full wrap period;
//! a signed difference would fire on every tick.

use log::debug;

/// `true` iff at least `period` ms have elapsed between `last` and `now`,
/// modulo 2^32.
pub const fn due(now: u32, last: u32, period: u32) -> bool {
    now.wrapping_sub(last) >= period
}

/// One periodic action owned by the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTimer {
    label: &'static str,
    period_ms: u32,
    last_ms: u32,
}

impl PeriodicTimer {
    /// New timer whose reference point is `0`, matching a counter that
    /// starts at boot.
    pub const fn new(label: &'static str, period_ms: u32) -> Self {
        Self {
            label,
            period_ms,
            last_ms: 0,
        }
    }

    /// Fire if due; on fire the reference point moves to `now`.
    pub fn poll(&mut self, now: u32) -> bool {
        if !due(now, self.last_ms, self.period_ms) {
            return false;
        }
        debug!(
            "Timer '{}': fired after {} ms",
            self.label,
            now.wrapping_sub(self.last_ms)
        );
        self.last_ms = now;
        true
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Timestamp of the last fire (or `0` before the first one).
    pub fn last_ms(&self) -> u32 {
        self.last_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
