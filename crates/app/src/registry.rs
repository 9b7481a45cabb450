//! Appliance registry — every configured appliance with its sender and pins.
//!
//! Hardware presence is resolved once here: an appliance either owns an
//! opened status output (and the debouncer gets its switch input) or it
//! does not, and the condition input is either open or absent.

use std::collections::BTreeMap;
use std::sync::Arc;

use remopi_domain::appliance::{Appliance, ApplianceKind};
use remopi_domain::error::{NotFoundError, RemoPiError, ValidationError};
use remopi_domain::id::ApplianceId;
use remopi_domain::level::{Level, PowerState};
use remopi_domain::status::ApplianceStatus;

use crate::ports::{Gpio, InputPin, OutputPin, RemoApi};
use crate::sender::ApplianceSender;

/// A configured appliance bound to its sender and opened pins.
pub struct ApplianceHandle<C, G: Gpio> {
    appliance: Appliance,
    sender: ApplianceSender<C>,
    status_pin: Option<G::Output>,
    condition_pin: Option<G::Input>,
}

impl<C: RemoApi, G: Gpio> ApplianceHandle<C, G> {
    #[must_use]
    pub fn new(
        appliance: Appliance,
        sender: ApplianceSender<C>,
        status_pin: Option<G::Output>,
        condition_pin: Option<G::Input>,
    ) -> Self {
        Self {
            appliance,
            sender,
            status_pin,
            condition_pin,
        }
    }

    #[must_use]
    pub fn appliance(&self) -> &Appliance {
        &self.appliance
    }

    #[must_use]
    pub fn id(&self) -> &ApplianceId {
        &self.appliance.id
    }

    #[must_use]
    pub fn kind(&self) -> ApplianceKind {
        self.appliance.kind()
    }

    #[must_use]
    pub fn sender(&self) -> &ApplianceSender<C> {
        &self.sender
    }

    #[must_use]
    pub fn has_status_pin(&self) -> bool {
        self.status_pin.is_some()
    }

    /// Whether the condition pin lets commands through.
    ///
    /// Without a condition pin every command passes. A low or unreadable
    /// condition pin blocks.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        let Some(pin) = &self.condition_pin else {
            return true;
        };
        match pin.read() {
            Ok(level) => level.is_high(),
            Err(err) => {
                tracing::warn!(
                    appliance_id = %self.appliance.id,
                    error = %err,
                    "condition pin unreadable, treating as low"
                );
                false
            }
        }
    }

    /// Power state shown by the status pin, when the appliance has one.
    ///
    /// # Errors
    ///
    /// Returns [`RemoPiError::Hardware`] when the pin cannot be read.
    pub fn pin_state(&self) -> Option<Result<PowerState, RemoPiError>> {
        self.status_pin.as_ref().map(|pin| {
            pin.read()
                .map(|level| self.appliance.status_type.power_for(level))
        })
    }

    /// Best current guess of the power state.
    ///
    /// Reads the status pin through its polarity; falls back to the light
    /// display when there is no readable pin, and to off otherwise.
    #[must_use]
    pub fn displayed_state(&self) -> PowerState {
        match self.pin_state() {
            Some(Ok(state)) => return state,
            Some(Err(err)) => {
                tracing::debug!(
                    appliance_id = %self.appliance.id,
                    error = %err,
                    "status pin unreadable, falling back to display"
                );
            }
            None => {}
        }
        self.sender
            .display()
            .and_then(|display| display.get())
            .unwrap_or(PowerState::Off)
    }

    /// Drive the status pin to show `state`. No-op without a status pin.
    ///
    /// # Errors
    ///
    /// Returns [`RemoPiError::Hardware`] when the pin cannot be written.
    pub fn show(&self, state: PowerState) -> Result<(), RemoPiError> {
        let Some(pin) = &self.status_pin else {
            return Ok(());
        };
        let level: Level = self.appliance.status_type.level_for(state);
        tracing::debug!(
            appliance_id = %self.appliance.id,
            power = %state,
            %level,
            "writing status pin"
        );
        pin.write(level)
    }

    /// Record `state` as the appliance's known state: display and pin.
    ///
    /// A failed pin write is logged; the display is updated regardless.
    pub fn record(&self, state: PowerState) {
        if let Some(display) = self.sender.display() {
            display.set(state);
        }
        if let Err(err) = self.show(state) {
            tracing::warn!(
                appliance_id = %self.appliance.id,
                error = %err,
                "failed to write status pin"
            );
        }
    }

    /// Status snapshot for downstream observers.
    #[must_use]
    pub fn status(&self, state: PowerState) -> ApplianceStatus {
        ApplianceStatus::observed_now(
            self.appliance.id.clone(),
            self.appliance.name.clone(),
            self.appliance.kind(),
            state,
        )
    }
}

/// A switch input handed to a debouncer.
pub struct SwitchInput<G: Gpio> {
    pub id: ApplianceId,
    pub pin: G::Input,
}

/// All configured appliances, keyed by id.
pub struct ApplianceRegistry<C, G: Gpio> {
    handles: BTreeMap<ApplianceId, Arc<ApplianceHandle<C, G>>>,
}

impl<C: RemoApi, G: Gpio> ApplianceRegistry<C, G> {
    /// Validate appliances, build their senders, and open their pins.
    ///
    /// Returns the registry together with the switch inputs to debounce.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for invalid or duplicate appliances, or
    /// [`RemoPiError::Hardware`] when a pin cannot be opened.
    pub fn load(
        appliances: Vec<Appliance>,
        api: &Arc<C>,
        gpio: &G,
    ) -> Result<(Self, Vec<SwitchInput<G>>), RemoPiError> {
        let mut handles = BTreeMap::new();
        let mut switches = Vec::new();

        for appliance in appliances {
            appliance.validate()?;
            if handles.contains_key(&appliance.id) {
                return Err(ValidationError::DuplicateId(appliance.id.to_string()).into());
            }

            let status_pin = appliance.status_pin.map(|pin| gpio.output(pin)).transpose()?;
            if let Some(pin) = &status_pin {
                // Every appliance starts out displayed as off.
                let off = appliance.status_type.level_for(PowerState::Off);
                if pin.read().ok() != Some(off) {
                    pin.write(off)?;
                }
            }
            let condition_pin = appliance
                .condition_pin
                .map(|pin| gpio.input(pin))
                .transpose()?;
            if let Some(pin) = appliance.switch_pin {
                switches.push(SwitchInput {
                    id: appliance.id.clone(),
                    pin: gpio.input(pin)?,
                });
            }

            tracing::info!(
                appliance_id = %appliance.id,
                name = %appliance.name,
                kind = %appliance.kind(),
                trigger = %appliance.trigger,
                hardware = appliance.is_hardware_backed(),
                "appliance registered"
            );
            let sender = ApplianceSender::for_appliance(&appliance, Arc::clone(api));
            let id = appliance.id.clone();
            handles.insert(
                id,
                Arc::new(ApplianceHandle::new(
                    appliance,
                    sender,
                    status_pin,
                    condition_pin,
                )),
            );
        }

        Ok((Self { handles }, switches))
    }

    /// Look up an appliance by id.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] when no appliance has this id.
    pub fn get(&self, id: &ApplianceId) -> Result<Arc<ApplianceHandle<C, G>>, NotFoundError> {
        self.handles.get(id).cloned().ok_or_else(|| NotFoundError {
            entity: "Appliance",
            id: id.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ApplianceHandle<C, G>>> {
        self.handles.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
