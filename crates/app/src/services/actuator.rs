//! Actuator — issues commands and mirrors their outcome onto status pins.
//!
//! Shared by the trigger dispatcher, the command service, and the cloud
//! reconciler, so every path obeys the same rule: the status pin is written
//! only after the appliance accepted the command.

use std::sync::Arc;

use remopi_domain::error::RemoPiError;
use remopi_domain::id::ApplianceId;
use remopi_domain::level::PowerState;

use crate::ports::{Gpio, RemoApi, StatusPublisher};
use crate::registry::{ApplianceHandle, ApplianceRegistry};
use crate::timers::{TimerClaim, TimerRegistry};

/// Issues commands through appliance senders and records their outcome.
pub struct Actuator<C, G: Gpio, P> {
    registry: Arc<ApplianceRegistry<C, G>>,
    timers: TimerRegistry,
    publisher: Arc<P>,
}

impl<C, G: Gpio, P> Clone for Actuator<C, G, P> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            timers: self.timers.clone(),
            publisher: Arc::clone(&self.publisher),
        }
    }
}

impl<C, G, P> Actuator<C, G, P>
where
    C: RemoApi,
    G: Gpio,
    P: StatusPublisher,
{
    #[must_use]
    pub fn new(
        registry: Arc<ApplianceRegistry<C, G>>,
        timers: TimerRegistry,
        publisher: Arc<P>,
    ) -> Self {
        Self {
            registry,
            timers,
            publisher,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ApplianceRegistry<C, G>> {
        &self.registry
    }

    #[must_use]
    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    /// Look up an appliance handle.
    ///
    /// # Errors
    ///
    /// Returns [`RemoPiError::NotFound`] for an unknown id.
    pub fn handle(&self, id: &ApplianceId) -> Result<Arc<ApplianceHandle<C, G>>, RemoPiError> {
        Ok(self.registry.get(id)?)
    }

    /// Turn the appliance on or off, then show and publish the result.
    ///
    /// Returns the state the appliance reached.
    ///
    /// # Errors
    ///
    /// Returns the sender's error; the status pin is left untouched.
    #[tracing::instrument(skip(self, handle), fields(appliance_id = %handle.id()))]
    pub async fn drive(
        &self,
        handle: &ApplianceHandle<C, G>,
        state: PowerState,
    ) -> Result<PowerState, RemoPiError> {
        let result = match state {
            PowerState::On => handle.sender().on().await,
            PowerState::Off => handle.sender().off().await,
        };
        let reported = result.inspect_err(|err| {
            tracing::warn!(error = %err, "command failed, status pin left unchanged");
        })?;
        let reached = reported.unwrap_or(state);
        self.settle(handle, reached).await;
        Ok(reached)
    }

    /// Flip the appliance relative to its displayed state.
    ///
    /// # Errors
    ///
    /// Returns the sender's error; the status pin is left untouched.
    pub async fn toggle(&self, handle: &ApplianceHandle<C, G>) -> Result<PowerState, RemoPiError> {
        let current = handle.displayed_state();
        self.drive(handle, current.toggled()).await
    }

    /// Press an arbitrary button. The pin follows only when the appliance
    /// reports a resulting state.
    ///
    /// # Errors
    ///
    /// Returns the sender's error; the status pin is left untouched.
    #[tracing::instrument(skip(self, handle), fields(appliance_id = %handle.id()))]
    pub async fn send_raw(
        &self,
        handle: &ApplianceHandle<C, G>,
        button: &str,
    ) -> Result<Option<PowerState>, RemoPiError> {
        let reported = handle.sender().send(button).await.inspect_err(|err| {
            tracing::warn!(error = %err, "command failed, status pin left unchanged");
        })?;
        if let Some(state) = reported {
            self.settle(handle, state).await;
        }
        Ok(reported)
    }

    /// Timer activation: on plus a delayed off, or a deadline reset.
    ///
    /// A pending timer is pushed back without sending on again. Without a
    /// usable duration the appliance is turned on and no off is scheduled.
    ///
    /// # Errors
    ///
    /// Returns the sender's error when turning on fails; no timer is armed.
    pub async fn activate_timer(&self, handle: &Arc<ApplianceHandle<C, G>>) -> Result<(), RemoPiError> {
        let id = handle.id().clone();
        let delay = match handle.appliance().timer_duration() {
            Some(Ok(delay)) => Some(delay),
            Some(Err(err)) => {
                tracing::warn!(appliance_id = %id, error = %err, "malformed timer, no automatic off");
                None
            }
            None => {
                tracing::warn!(appliance_id = %id, "timer trigger without duration, no automatic off");
                None
            }
        };
        let Some(delay) = delay else {
            self.drive(handle, PowerState::On).await?;
            return Ok(());
        };

        let pending = match self.timers.claim(id.clone(), delay) {
            Ok(TimerClaim::Reserved(pending)) => pending,
            Ok(TimerClaim::Restarted) => {
                tracing::info!(appliance_id = %id, ?delay, "off timer pushed back");
                return Ok(());
            }
            Err(err) => {
                tracing::warn!(appliance_id = %id, error = %err, "malformed timer, no automatic off");
                self.drive(handle, PowerState::On).await?;
                return Ok(());
            }
        };

        // A failed on drops the reservation, releasing the slot.
        self.drive(handle, PowerState::On).await?;

        let actuator = self.clone();
        let expiring = Arc::clone(handle);
        pending.start(async move {
            if let Err(err) = actuator.drive(&expiring, PowerState::Off).await {
                tracing::warn!(
                    appliance_id = %expiring.id(),
                    error = %err,
                    "automatic off failed"
                );
            }
        });
        tracing::info!(appliance_id = %id, ?delay, "off timer armed");
        Ok(())
    }

    /// Adopt a state reported by the cloud.
    ///
    /// Returns `true` when it differs from what was known, in which case a
    /// status is published.
    pub async fn reconcile(&self, handle: &ApplianceHandle<C, G>, state: PowerState) -> bool {
        let previous = handle
            .sender()
            .display()
            .and_then(|display| display.get())
            .or_else(|| handle.pin_state().and_then(Result::ok));
        handle.record(state);
        if previous == Some(state) {
            return false;
        }
        tracing::info!(
            appliance_id = %handle.id(),
            power = %state,
            "state corrected from cloud"
        );
        self.publish(handle, state).await;
        true
    }

    async fn settle(&self, handle: &ApplianceHandle<C, G>, state: PowerState) {
        handle.record(state);
        self.publish(handle, state).await;
    }

    async fn publish(&self, handle: &ApplianceHandle<C, G>, state: PowerState) {
        if let Err(err) = self.publisher.publish(handle.status(state)).await {
            tracing::warn!(appliance_id = %handle.id(), error = %err, "failed to publish status");
        }
    }
}
