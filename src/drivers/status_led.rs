//! Discrete status LED driver.
//!
//! Three GPIO outputs (see [`crate::pins`]), active high.  The driver
//! remembers the commanded level so `toggle` does not need to read the
//! pin back.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::digital::OutputPin`: on ESP-IDF the pins are
//! `PinDriver`s, on host/test [`NullPin`] tracks state in-memory only.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, PinState};
use log::warn;

use crate::app::ports::{Indicator, IndicatorPort};

pub struct StatusLeds<P: OutputPin> {
    alive: P,
    link: P,
    error: P,
    /// Commanded levels: alive, link recovery, acquisition error.
    state: [bool; 3],
}

const fn slot(indicator: Indicator) -> usize {
    match indicator {
        Indicator::Alive => 0,
        Indicator::LinkRecovery => 1,
        Indicator::AcquisitionError => 2,
    }
}

impl<P: OutputPin> StatusLeds<P> {
    /// Take the pins and drive all three low.
    pub fn new(alive: P, link: P, error: P) -> Self {
        let mut leds = Self {
            alive,
            link,
            error,
            state: [true; 3],
        };
        leds.all_off();
        leds
    }

    pub fn all_off(&mut self) {
        for i in [Indicator::Alive, Indicator::LinkRecovery, Indicator::AcquisitionError] {
            self.set(i, false);
        }
    }

    fn pin(&mut self, indicator: Indicator) -> &mut P {
        match indicator {
            Indicator::Alive => &mut self.alive,
            Indicator::LinkRecovery => &mut self.link,
            Indicator::AcquisitionError => &mut self.error,
        }
    }
}

impl<P: OutputPin> IndicatorPort for StatusLeds<P> {
    fn set(&mut self, indicator: Indicator, on: bool) {
        if self.pin(indicator).set_state(PinState::from(on)).is_err() {
            warn!("LED {:?}: GPIO write failed", indicator);
        }
        self.state[slot(indicator)] = on;
    }

    fn toggle(&mut self, indicator: Indicator) {
        let on = !self.state[slot(indicator)];
        self.set(indicator, on);
    }

    fn is_on(&self, indicator: Indicator) -> bool {
        self.state[slot(indicator)]
    }
}

/// Pin stand-in for hosts without GPIO.
#[derive(Debug, Default)]
pub struct NullPin {
    pub high: bool,
}

impl ErrorType for NullPin {
    type Error = Infallible;
}

impl OutputPin for NullPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}
