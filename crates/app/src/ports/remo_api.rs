//! Cloud appliance API port.
//!
//! Covers the calls the engine issues against the Nature Remo cloud plus
//! the LAN endpoint of a local IR emitter.

use std::future::Future;

use remopi_domain::error::RemoPiError;
use remopi_domain::id::{ApplianceId, SignalId};
use remopi_domain::ir::IrSignal;
use remopi_domain::level::PowerState;

/// An appliance as reported by the cloud listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudAppliance {
    pub id: ApplianceId,
    /// Reported power of a light, `None` for every other kind.
    pub light_power: Option<PowerState>,
}

/// Remote procedure calls against the appliance control service.
pub trait RemoApi: Send + Sync + 'static {
    /// Press a light button; the cloud answers with the resulting state.
    fn send_light(
        &self,
        appliance: &ApplianceId,
        button: &str,
    ) -> impl Future<Output = Result<PowerState, RemoPiError>> + Send;

    /// Press a TV button.
    fn send_tv(
        &self,
        appliance: &ApplianceId,
        button: &str,
    ) -> impl Future<Output = Result<(), RemoPiError>> + Send;

    /// Send a learned IR signal.
    fn send_signal(&self, signal: &SignalId)
    -> impl Future<Output = Result<(), RemoPiError>> + Send;

    /// List every appliance registered in the cloud.
    fn list_appliances(&self)
    -> impl Future<Output = Result<Vec<CloudAppliance>, RemoPiError>> + Send;

    /// Emit a raw IR code through the emitter at `ip`.
    fn emit_local(
        &self,
        ip: &str,
        signal: &IrSignal,
    ) -> impl Future<Output = Result<(), RemoPiError>> + Send;
}

impl<T: RemoApi> RemoApi for std::sync::Arc<T> {
    fn send_light(
        &self,
        appliance: &ApplianceId,
        button: &str,
    ) -> impl Future<Output = Result<PowerState, RemoPiError>> + Send {
        (**self).send_light(appliance, button)
    }

    fn send_tv(
        &self,
        appliance: &ApplianceId,
        button: &str,
    ) -> impl Future<Output = Result<(), RemoPiError>> + Send {
        (**self).send_tv(appliance, button)
    }

    fn send_signal(
        &self,
        signal: &SignalId,
    ) -> impl Future<Output = Result<(), RemoPiError>> + Send {
        (**self).send_signal(signal)
    }

    fn list_appliances(
        &self,
    ) -> impl Future<Output = Result<Vec<CloudAppliance>, RemoPiError>> + Send {
        (**self).list_appliances()
    }

    fn emit_local(
        &self,
        ip: &str,
        signal: &IrSignal,
    ) -> impl Future<Output = Result<(), RemoPiError>> + Send {
        (**self).emit_local(ip, signal)
    }
}
