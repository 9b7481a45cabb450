//! Control service — executes inbound HTTP and MQTT commands.

use remopi_domain::appliance::ApplianceKind;
use remopi_domain::button::Button;
use remopi_domain::error::{RemoPiError, UnsupportedError};
use remopi_domain::id::ApplianceId;
use remopi_domain::level::PowerState;
use remopi_domain::trigger::Trigger;

use crate::ports::{CommandHandler, CommandOutcome, Gpio, RemoApi, StatusPublisher};
use crate::services::actuator::Actuator;

/// Application service behind the inbound command adapters.
///
/// Shares the actuator, and therefore the status pins, condition gates and
/// timers, with the trigger dispatcher.
pub struct ControlService<C, G: Gpio, P> {
    actuator: Actuator<C, G, P>,
}

impl<C, G: Gpio, P> Clone for ControlService<C, G, P> {
    fn clone(&self) -> Self {
        Self {
            actuator: self.actuator.clone(),
        }
    }
}

impl<C, G, P> ControlService<C, G, P>
where
    C: RemoApi,
    G: Gpio,
    P: StatusPublisher,
{
    #[must_use]
    pub fn new(actuator: Actuator<C, G, P>) -> Self {
        Self { actuator }
    }
}

impl<C, G, P> CommandHandler for ControlService<C, G, P>
where
    C: RemoApi,
    G: Gpio,
    P: StatusPublisher,
{
    #[tracing::instrument(skip(self, id, button), fields(appliance_id = %id, %button))]
    async fn execute(&self, id: &ApplianceId, button: Button) -> Result<CommandOutcome, RemoPiError> {
        let handle = self.actuator.handle(id)?;
        if !handle.is_enabled() {
            tracing::info!("condition pin low, command ignored");
            return Ok(CommandOutcome::Ignored);
        }

        if handle.appliance().trigger == Trigger::Timer {
            self.actuator.activate_timer(&handle).await?;
            return Ok(CommandOutcome::Executed);
        }

        match button {
            Button::On => {
                self.actuator.drive(&handle, PowerState::On).await?;
            }
            Button::Off => {
                self.actuator.drive(&handle, PowerState::Off).await?;
            }
            Button::Toggle => {
                self.actuator.toggle(&handle).await?;
            }
            Button::Raw(name) => {
                self.actuator.send_raw(&handle, &name).await?;
            }
        }
        Ok(CommandOutcome::Executed)
    }

    async fn status(&self, id: &ApplianceId) -> Result<PowerState, RemoPiError> {
        let handle = self.actuator.handle(id)?;
        if let Some(state) = handle.pin_state() {
            return state;
        }
        if handle.kind() == ApplianceKind::Light {
            return Ok(handle
                .sender()
                .display()
                .and_then(|display| display.get())
                .unwrap_or(PowerState::Off));
        }
        Err(UnsupportedError::WrongKind {
            id: id.to_string(),
            kind: handle.kind(),
        }
        .into())
    }

    #[tracing::instrument(skip(self, id, power), fields(appliance_id = %id, %power))]
    async fn apply_remote_status(&self, id: &ApplianceId, power: PowerState) -> Result<(), RemoPiError> {
        let handle = self.actuator.handle(id)?;
        if let Some(display) = handle.sender().display() {
            display.set(power);
        }
        handle.show(power)
    }
}
