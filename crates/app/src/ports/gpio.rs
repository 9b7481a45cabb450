//! GPIO port — digital inputs and outputs.
//!
//! Pin access is synchronous: a sysfs read or write is a short file operation
//! and the pollers call it from their own task.

use remopi_domain::appliance::PinNumber;
use remopi_domain::error::RemoPiError;
use remopi_domain::level::Level;

/// A pin configured as a digital input.
pub trait InputPin: Send + Sync + 'static {
    /// Sample the current level.
    ///
    /// # Errors
    ///
    /// Returns [`RemoPiError::Hardware`] when the pin cannot be read.
    fn read(&self) -> Result<Level, RemoPiError>;
}

/// A pin configured as a digital output that can also be read back.
pub trait OutputPin: Send + Sync + 'static {
    /// Read the level currently driven on the pin.
    ///
    /// # Errors
    ///
    /// Returns [`RemoPiError::Hardware`] when the pin cannot be read.
    fn read(&self) -> Result<Level, RemoPiError>;

    /// Drive the pin to `level`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoPiError::Hardware`] when the pin cannot be written.
    fn write(&self, level: Level) -> Result<(), RemoPiError>;
}

/// Opens pins on a concrete GPIO backend.
pub trait Gpio: Send + Sync + 'static {
    type Input: InputPin;
    type Output: OutputPin;

    /// Export `pin` and configure it as an input.
    ///
    /// # Errors
    ///
    /// Returns [`RemoPiError::Hardware`] when the pin cannot be claimed.
    fn input(&self, pin: PinNumber) -> Result<Self::Input, RemoPiError>;

    /// Export `pin` and configure it as an output.
    ///
    /// # Errors
    ///
    /// Returns [`RemoPiError::Hardware`] when the pin cannot be claimed.
    fn output(&self, pin: PinNumber) -> Result<Self::Output, RemoPiError>;
}
