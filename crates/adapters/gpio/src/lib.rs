//! # remopi-adapter-gpio
//!
//! Digital pin backends implementing the [`Gpio`](remopi_app::ports::Gpio) port.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`SysfsGpio`] | Linux boards, through `/sys/class/gpio` |
//! | [`VirtualGpio`] | Demos and tests; pins live in memory and can be driven by hand |
//!
//! ## Dependency rule
//!
//! Depends on `remopi-app` (port traits) and `remopi-domain` only.

pub mod error;
pub mod sysfs;
pub mod virtual_gpio;

pub use error::GpioError;
pub use sysfs::SysfsGpio;
pub use virtual_gpio::VirtualGpio;
