//! Appliance senders — the on/off/send capability of each appliance variant.
//!
//! A sender is built once from an [`Appliance`] when the registry loads and
//! never changes afterwards, except for the in-memory display state a light
//! keeps.

use std::sync::{Arc, Mutex, PoisonError};

use remopi_domain::appliance::{Appliance, ApplianceVariant};
use remopi_domain::error::{RemoPiError, ValidationError};
use remopi_domain::id::{ApplianceId, SignalId};
use remopi_domain::ir::IrSignal;
use remopi_domain::level::PowerState;

use crate::ports::RemoApi;

/// Last known power state of a light, kept in memory only.
#[derive(Debug, Default)]
pub struct LightDisplay {
    state: Mutex<Option<PowerState>>,
}

impl LightDisplay {
    pub fn set(&self, state: PowerState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state);
    }

    /// `None` until a command or reconciliation has reported a state.
    #[must_use]
    pub fn get(&self) -> Option<PowerState> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One sender per appliance variant.
pub enum ApplianceSender<C> {
    Light {
        api: Arc<C>,
        id: ApplianceId,
        on_button: String,
        off_button: String,
        display: LightDisplay,
    },
    Tv {
        api: Arc<C>,
        id: ApplianceId,
        on_button: String,
        off_button: String,
    },
    Signal {
        api: Arc<C>,
        on_signal: SignalId,
        off_signal: SignalId,
    },
    LocalIr {
        api: Arc<C>,
        ip: String,
        on_local: IrSignal,
        off_local: IrSignal,
    },
}

impl<C: RemoApi> ApplianceSender<C> {
    /// Build the sender matching the appliance's variant.
    #[must_use]
    pub fn for_appliance(appliance: &Appliance, api: Arc<C>) -> Self {
        let variant = &appliance.variant;
        match variant {
            ApplianceVariant::Light { .. } => Self::Light {
                api,
                id: appliance.id.clone(),
                on_button: variant.on_button().to_string(),
                off_button: variant.off_button().to_string(),
                display: LightDisplay::default(),
            },
            ApplianceVariant::Tv { .. } => Self::Tv {
                api,
                id: appliance.id.clone(),
                on_button: variant.on_button().to_string(),
                off_button: variant.off_button().to_string(),
            },
            ApplianceVariant::InfraredSignal {
                on_signal,
                off_signal,
            } => Self::Signal {
                api,
                on_signal: on_signal.clone(),
                off_signal: off_signal.clone(),
            },
            ApplianceVariant::LocalInfrared {
                ip,
                on_local,
                off_local,
            } => Self::LocalIr {
                api,
                ip: ip.clone(),
                on_local: on_local.clone(),
                off_local: off_local.clone(),
            },
        }
    }

    /// Turn the appliance on.
    ///
    /// Returns the power state the appliance reported, when it reports one.
    ///
    /// # Errors
    ///
    /// Returns [`RemoPiError::Upstream`] when the command was not delivered.
    pub async fn on(&self) -> Result<Option<PowerState>, RemoPiError> {
        match self {
            Self::Light { on_button, .. } | Self::Tv { on_button, .. } => {
                self.send(on_button).await
            }
            Self::Signal { api, on_signal, .. } => {
                api.send_signal(on_signal).await?;
                Ok(None)
            }
            Self::LocalIr {
                api, ip, on_local, ..
            } => {
                api.emit_local(ip, on_local).await?;
                Ok(None)
            }
        }
    }

    /// Turn the appliance off.
    ///
    /// # Errors
    ///
    /// Returns [`RemoPiError::Upstream`] when the command was not delivered.
    pub async fn off(&self) -> Result<Option<PowerState>, RemoPiError> {
        match self {
            Self::Light { off_button, .. } | Self::Tv { off_button, .. } => {
                self.send(off_button).await
            }
            Self::Signal {
                api, off_signal, ..
            } => {
                api.send_signal(off_signal).await?;
                Ok(None)
            }
            Self::LocalIr {
                api, ip, off_local, ..
            } => {
                api.emit_local(ip, off_local).await?;
                Ok(None)
            }
        }
    }

    /// Press an arbitrary button, or send an arbitrary signal id.
    ///
    /// Local emitters have no named buttons; the call is accepted and
    /// nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns [`RemoPiError::Upstream`] when the command was not delivered,
    /// or a validation error when `button` is not a valid signal id.
    pub async fn send(&self, button: &str) -> Result<Option<PowerState>, RemoPiError> {
        match self {
            Self::Light {
                api, id, display, ..
            } => {
                let power = api.send_light(id, button).await?;
                display.set(power);
                Ok(Some(power))
            }
            Self::Tv { api, id, .. } => {
                api.send_tv(id, button).await?;
                Ok(None)
            }
            Self::Signal { api, .. } => {
                let signal = SignalId::new(button).map_err(|_| ValidationError::EmptyButton)?;
                api.send_signal(&signal).await?;
                Ok(None)
            }
            Self::LocalIr { ip, .. } => {
                tracing::debug!(%ip, %button, "local emitter has no named buttons, nothing sent");
                Ok(None)
            }
        }
    }

    /// The light display, for senders that keep one.
    #[must_use]
    pub fn display(&self) -> Option<&LightDisplay> {
        match self {
            Self::Light { display, .. } => Some(display),
            Self::Tv { .. } | Self::Signal { .. } | Self::LocalIr { .. } => None,
        }
    }
}
