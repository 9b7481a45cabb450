//! Command ports: the inbound side used by the HTTP and MQTT adapters, and
//! the outbound side a switch-only node uses to hand presses to a broker.

use std::future::Future;

use remopi_domain::button::Button;
use remopi_domain::error::RemoPiError;
use remopi_domain::id::ApplianceId;
use remopi_domain::level::PowerState;

/// Result of an accepted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command reached the appliance.
    Executed,
    /// The condition pin was low; nothing was sent.
    Ignored,
}

/// Executes commands and answers status queries for configured appliances.
pub trait CommandHandler: Send + Sync + 'static {
    /// Run `button` against appliance `id`.
    fn execute(
        &self,
        id: &ApplianceId,
        button: Button,
    ) -> impl Future<Output = Result<CommandOutcome, RemoPiError>> + Send;

    /// Current power state of appliance `id`.
    fn status(&self, id: &ApplianceId)
    -> impl Future<Output = Result<PowerState, RemoPiError>> + Send;

    /// Mirror a status observed elsewhere onto the local status pin.
    fn apply_remote_status(
        &self,
        id: &ApplianceId,
        power: PowerState,
    ) -> impl Future<Output = Result<(), RemoPiError>> + Send;
}

impl<T: CommandHandler> CommandHandler for std::sync::Arc<T> {
    fn execute(
        &self,
        id: &ApplianceId,
        button: Button,
    ) -> impl Future<Output = Result<CommandOutcome, RemoPiError>> + Send {
        (**self).execute(id, button)
    }

    fn status(
        &self,
        id: &ApplianceId,
    ) -> impl Future<Output = Result<PowerState, RemoPiError>> + Send {
        (**self).status(id)
    }

    fn apply_remote_status(
        &self,
        id: &ApplianceId,
        power: PowerState,
    ) -> impl Future<Output = Result<(), RemoPiError>> + Send {
        (**self).apply_remote_status(id, power)
    }
}

/// Sends a command for another controller to execute.
pub trait CommandPublisher: Send + Sync + 'static {
    fn publish_command(
        &self,
        id: &ApplianceId,
        button: Button,
    ) -> impl Future<Output = Result<(), RemoPiError>> + Send;
}

impl<T: CommandPublisher> CommandPublisher for std::sync::Arc<T> {
    fn publish_command(
        &self,
        id: &ApplianceId,
        button: Button,
    ) -> impl Future<Output = Result<(), RemoPiError>> + Send {
        (**self).publish_command(id, button)
    }
}
