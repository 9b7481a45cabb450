//! In-memory pin backend.
//!
//! Every pin starts low. Clones share the same pins, so a demo harness or a
//! test can flip a switch input and watch the status outputs change.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use remopi_app::ports::{Gpio, InputPin, OutputPin};
use remopi_domain::appliance::PinNumber;
use remopi_domain::error::RemoPiError;
use remopi_domain::level::Level;

use crate::error::GpioError;

type Pins = Arc<Mutex<HashMap<PinNumber, Level>>>;

/// Simulated pin bank.
#[derive(Debug, Clone, Default)]
pub struct VirtualGpio {
    pins: Pins,
    unavailable: Arc<Mutex<HashSet<PinNumber>>>,
}

/// A pin of a [`VirtualGpio`] bank.
#[derive(Debug, Clone)]
pub struct VirtualPin {
    number: PinNumber,
    pins: Pins,
}

impl VirtualGpio {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive a pin from outside, as a physical switch would.
    pub fn set_level(&self, pin: PinNumber, level: Level) {
        tracing::debug!(pin, %level, "virtual pin driven");
        lock(&self.pins).insert(pin, level);
    }

    /// Current level of a pin; pins never touched read low.
    #[must_use]
    pub fn level(&self, pin: PinNumber) -> Level {
        lock(&self.pins).get(&pin).copied().unwrap_or(Level::Low)
    }

    /// Refuse to open `pin`, as when it is claimed by another process.
    pub fn make_unavailable(&self, pin: PinNumber) {
        lock(&self.unavailable).insert(pin);
    }

    fn open(&self, pin: PinNumber) -> Result<VirtualPin, GpioError> {
        if lock(&self.unavailable).contains(&pin) {
            return Err(GpioError::Unavailable(pin));
        }
        lock(&self.pins).entry(pin).or_insert(Level::Low);
        Ok(VirtualPin {
            number: pin,
            pins: Arc::clone(&self.pins),
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl VirtualPin {
    fn current(&self) -> Level {
        lock(&self.pins).get(&self.number).copied().unwrap_or(Level::Low)
    }
}

impl InputPin for VirtualPin {
    fn read(&self) -> Result<Level, RemoPiError> {
        Ok(self.current())
    }
}

impl OutputPin for VirtualPin {
    fn read(&self) -> Result<Level, RemoPiError> {
        Ok(self.current())
    }

    fn write(&self, level: Level) -> Result<(), RemoPiError> {
        lock(&self.pins).insert(self.number, level);
        Ok(())
    }
}

impl Gpio for VirtualGpio {
    type Input = VirtualPin;
    type Output = VirtualPin;

    fn input(&self, pin: PinNumber) -> Result<VirtualPin, RemoPiError> {
        Ok(self.open(pin)?)
    }

    fn output(&self, pin: PinNumber) -> Result<VirtualPin, RemoPiError> {
        Ok(self.open(pin)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_start_low() {
        let gpio = VirtualGpio::new();
        let pin = gpio.input(17).unwrap();
        assert_eq!(InputPin::read(&pin).unwrap(), Level::Low);
    }

    #[test]
    fn should_share_levels_between_bank_and_pins() {
        let gpio = VirtualGpio::new();
        let switch = gpio.input(17).unwrap();
        let status = gpio.output(27).unwrap();

        gpio.set_level(17, Level::High);
        status.write(Level::High).unwrap();

        assert_eq!(InputPin::read(&switch).unwrap(), Level::High);
        assert_eq!(gpio.level(27), Level::High);
        assert_eq!(gpio.clone().level(27), Level::High);
    }

    #[test]
    fn should_refuse_unavailable_pins() {
        let gpio = VirtualGpio::new();
        gpio.make_unavailable(4);

        let err = gpio.output(4).unwrap_err();

        assert!(matches!(err, RemoPiError::Hardware(_)));
    }
}
