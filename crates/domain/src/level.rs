//! Electrical pin levels and logical power states.

use serde::{Deserialize, Serialize};

/// Electrical level of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[must_use]
    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }

    /// Interpret a raw `0`/non-zero pin value.
    #[must_use]
    pub fn from_raw(value: u8) -> Self {
        if value == 0 { Self::Low } else { Self::High }
    }

    #[must_use]
    pub fn as_raw(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }

    #[must_use]
    pub fn inverted(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::High => f.write_str("high"),
        }
    }
}

/// Logical power state of an appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }

    /// Parse the `power` field reported by the cloud (`"on"` / `"off"`).
    ///
    /// Anything other than `"on"` counts as off.
    #[must_use]
    pub fn from_power_field(power: &str) -> Self {
        if power.eq_ignore_ascii_case("on") {
            Self::On
        } else {
            Self::Off
        }
    }

    /// The `0`/`1` digit used on the control endpoint.
    #[must_use]
    pub fn as_digit(self) -> &'static str {
        match self {
            Self::On => "1",
            Self::Off => "0",
        }
    }

    /// Parse a `0`/`1` body returned by a peer controller.
    #[must_use]
    pub fn from_digit(body: &str) -> Option<Self> {
        match body.trim() {
            "1" => Some(Self::On),
            "0" => Some(Self::Off),
            _ => None,
        }
    }
}

impl From<bool> for PowerState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}
