//! Button — the vocabulary of inbound commands.

use std::str::FromStr;

use crate::error::ValidationError;

/// A command requested over HTTP or MQTT.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Button {
    On,
    Off,
    Toggle,
    /// Any other button or signal name, passed through to the sender.
    Raw(String),
}

impl FromStr for Button {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(ValidationError::EmptyButton),
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "toggle" => Ok(Self::Toggle),
            other => Ok(Self::Raw(other.to_string())),
        }
    }
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Toggle => f.write_str("toggle"),
            Self::Raw(name) => f.write_str(name),
        }
    }
}
