//! GPIO adapter error types.

use remopi_domain::appliance::PinNumber;
use remopi_domain::error::RemoPiError;

/// Errors raised by the pin backends.
#[derive(Debug, thiserror::Error)]
pub enum GpioError {
    #[error("failed to export gpio {pin}")]
    Export {
        pin: PinNumber,
        #[source]
        source: sysfs_gpio::Error,
    },

    #[error("failed to read gpio {pin}")]
    Read {
        pin: PinNumber,
        #[source]
        source: sysfs_gpio::Error,
    },

    #[error("failed to write gpio {pin}")]
    Write {
        pin: PinNumber,
        #[source]
        source: sysfs_gpio::Error,
    },

    /// The virtual backend was told to refuse this pin.
    #[error("gpio {0} is unavailable")]
    Unavailable(PinNumber),
}

impl From<GpioError> for RemoPiError {
    fn from(err: GpioError) -> Self {
        RemoPiError::hardware(err)
    }
}
