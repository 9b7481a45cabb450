//! Linux sysfs backend.

use sysfs_gpio::{Direction, Pin};

use remopi_app::ports::{Gpio, InputPin, OutputPin};
use remopi_domain::appliance::PinNumber;
use remopi_domain::error::RemoPiError;
use remopi_domain::level::Level;

use crate::error::GpioError;

/// Pins exported through `/sys/class/gpio`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysfsGpio;

/// An exported sysfs pin.
#[derive(Debug)]
pub struct SysfsPin {
    number: PinNumber,
    pin: Pin,
}

impl SysfsGpio {
    fn open(pin: PinNumber, direction: Direction) -> Result<SysfsPin, GpioError> {
        let handle = Pin::new(u64::from(pin));
        handle
            .export()
            .and_then(|()| handle.set_direction(direction))
            .map_err(|source| GpioError::Export { pin, source })?;
        tracing::debug!(pin, ?direction, "gpio exported");
        Ok(SysfsPin {
            number: pin,
            pin: handle,
        })
    }
}

impl SysfsPin {
    fn read_level(&self) -> Result<Level, RemoPiError> {
        let value = self.pin.get_value().map_err(|source| GpioError::Read {
            pin: self.number,
            source,
        })?;
        Ok(Level::from_raw(value))
    }
}

impl InputPin for SysfsPin {
    fn read(&self) -> Result<Level, RemoPiError> {
        self.read_level()
    }
}

impl OutputPin for SysfsPin {
    fn read(&self) -> Result<Level, RemoPiError> {
        self.read_level()
    }

    fn write(&self, level: Level) -> Result<(), RemoPiError> {
        self.pin.set_value(level.as_raw()).map_err(|source| GpioError::Write {
            pin: self.number,
            source,
        })?;
        Ok(())
    }
}

impl Gpio for SysfsGpio {
    type Input = SysfsPin;
    type Output = SysfsPin;

    fn input(&self, pin: PinNumber) -> Result<SysfsPin, RemoPiError> {
        Ok(Self::open(pin, Direction::In)?)
    }

    /// Output pins start low.
    fn output(&self, pin: PinNumber) -> Result<SysfsPin, RemoPiError> {
        Ok(Self::open(pin, Direction::Low)?)
    }
}
