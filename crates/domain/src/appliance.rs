//! Appliance — a controllable device and the pins wired to it.
//!
//! An appliance pairs a cloud (or LAN) command target with up to three GPIO
//! lines: a switch input, a status output, and an optional condition input
//! that gates the switch. Appliances without pins are reachable only through
//! HTTP/MQTT commands.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration;
use crate::error::ValidationError;
use crate::id::{ApplianceId, SignalId};
use crate::ir::IrSignal;
use crate::status_type::StatusType;
use crate::trigger::Trigger;

/// Hardware pin number as exposed by the GPIO backend.
pub type PinNumber = u32;

/// Discriminant of [`ApplianceVariant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplianceKind {
    #[serde(alias = "LIGHT")]
    Light,
    #[serde(alias = "TV")]
    Tv,
    #[serde(alias = "IR", alias = "ir")]
    InfraredSignal,
    #[serde(alias = "LOCAL", alias = "local")]
    LocalInfrared,
}

impl ApplianceKind {
    /// Whether commands are raw infrared emissions (cloud signal or LAN).
    #[must_use]
    pub fn is_infrared(self) -> bool {
        matches!(self, Self::InfraredSignal | Self::LocalInfrared)
    }
}

impl std::fmt::Display for ApplianceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Tv => f.write_str("tv"),
            Self::InfraredSignal => f.write_str("infrared_signal"),
            Self::LocalInfrared => f.write_str("local_infrared"),
        }
    }
}

/// Variant-specific command data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplianceVariant {
    /// Cloud light; buttons default to `"on"` / `"off"`.
    Light {
        on_button: Option<String>,
        off_button: Option<String>,
    },
    /// Cloud TV; buttons default to `"on"` / `"off"`.
    Tv {
        on_button: Option<String>,
        off_button: Option<String>,
    },
    /// Learned IR signals registered in the cloud.
    InfraredSignal {
        on_signal: SignalId,
        off_signal: SignalId,
    },
    /// Raw IR codes emitted by a device on the LAN.
    LocalInfrared {
        ip: String,
        on_local: IrSignal,
        off_local: IrSignal,
    },
}

impl ApplianceVariant {
    #[must_use]
    pub fn kind(&self) -> ApplianceKind {
        match self {
            Self::Light { .. } => ApplianceKind::Light,
            Self::Tv { .. } => ApplianceKind::Tv,
            Self::InfraredSignal { .. } => ApplianceKind::InfraredSignal,
            Self::LocalInfrared { .. } => ApplianceKind::LocalInfrared,
        }
    }

    /// Button names used to forward on/off to a peer controller.
    #[must_use]
    pub fn on_button(&self) -> &str {
        match self {
            Self::Light { on_button, .. } | Self::Tv { on_button, .. } => {
                on_button.as_deref().unwrap_or("on")
            }
            Self::InfraredSignal { .. } | Self::LocalInfrared { .. } => "on",
        }
    }

    #[must_use]
    pub fn off_button(&self) -> &str {
        match self {
            Self::Light { off_button, .. } | Self::Tv { off_button, .. } => {
                off_button.as_deref().unwrap_or("off")
            }
            Self::InfraredSignal { .. } | Self::LocalInfrared { .. } => "off",
        }
    }
}

/// A configured appliance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appliance {
    pub id: ApplianceId,
    pub name: String,
    pub variant: ApplianceVariant,
    pub trigger: Trigger,
    pub status_type: StatusType,
    pub switch_pin: Option<PinNumber>,
    pub status_pin: Option<PinNumber>,
    pub condition_pin: Option<PinNumber>,
    /// Delay before the automatic off of a [`Trigger::Timer`] appliance.
    pub timer: Option<String>,
}

impl Appliance {
    /// Create a builder for constructing an [`Appliance`].
    #[must_use]
    pub fn builder() -> ApplianceBuilder {
        ApplianceBuilder::default()
    }

    #[must_use]
    pub fn kind(&self) -> ApplianceKind {
        self.variant.kind()
    }

    /// Whether a physical switch drives this appliance.
    #[must_use]
    pub fn is_hardware_backed(&self) -> bool {
        self.switch_pin.is_some()
    }

    /// Parse the configured timer duration.
    ///
    /// Returns `None` when no timer is configured.
    #[must_use]
    pub fn timer_duration(&self) -> Option<Result<Duration, ValidationError>> {
        self.timer.as_deref().map(duration::parse)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the name is empty, only one of the
    /// switch/status pins is set, or a local IR appliance has no address.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.switch_pin.is_some() != self.status_pin.is_some() {
            return Err(ValidationError::UnpairedPins {
                id: self.id.to_string(),
            });
        }
        if let ApplianceVariant::LocalInfrared { ip, .. } = &self.variant
            && ip.trim().is_empty()
        {
            return Err(ValidationError::MissingField {
                id: self.id.to_string(),
                kind: ApplianceKind::LocalInfrared,
                field: "ip",
            });
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Appliance`].
#[derive(Debug, Default)]
pub struct ApplianceBuilder {
    id: Option<ApplianceId>,
    name: Option<String>,
    variant: Option<ApplianceVariant>,
    trigger: Trigger,
    status_type: StatusType,
    switch_pin: Option<PinNumber>,
    status_pin: Option<PinNumber>,
    condition_pin: Option<PinNumber>,
    timer: Option<String>,
}

impl ApplianceBuilder {
    #[must_use]
    pub fn id(mut self, id: ApplianceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn variant(mut self, variant: ApplianceVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    #[must_use]
    pub fn status_type(mut self, status_type: StatusType) -> Self {
        self.status_type = status_type;
        self
    }

    /// Wire a switch input and its status output together.
    #[must_use]
    pub fn pins(mut self, switch_pin: PinNumber, status_pin: PinNumber) -> Self {
        self.switch_pin = Some(switch_pin);
        self.status_pin = Some(status_pin);
        self
    }

    #[must_use]
    pub fn switch_pin(mut self, pin: Option<PinNumber>) -> Self {
        self.switch_pin = pin;
        self
    }

    #[must_use]
    pub fn status_pin(mut self, pin: Option<PinNumber>) -> Self {
        self.status_pin = pin;
        self
    }

    #[must_use]
    pub fn condition_pin(mut self, pin: Option<PinNumber>) -> Self {
        self.condition_pin = pin;
        self
    }

    #[must_use]
    pub fn timer(mut self, timer: impl Into<String>) -> Self {
        self.timer = Some(timer.into());
        self
    }

    /// Consume the builder, validate, and return an [`Appliance`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyId`] or [`ValidationError::MissingKind`]
    /// when required fields are absent, or any error from
    /// [`Appliance::validate`].
    pub fn build(self) -> Result<Appliance, ValidationError> {
        let appliance = Appliance {
            id: self.id.ok_or(ValidationError::EmptyId)?,
            name: self.name.unwrap_or_default(),
            variant: self.variant.ok_or(ValidationError::MissingKind)?,
            trigger: self.trigger,
            status_type: self.status_type,
            switch_pin: self.switch_pin,
            status_pin: self.status_pin,
            condition_pin: self.condition_pin,
            timer: self.timer,
        };
        appliance.validate()?;
        Ok(appliance)
    }
}
