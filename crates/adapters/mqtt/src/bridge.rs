//! Broker connection loop.
//!
//! Drives the rumqttc event loop, (re)subscribes after every connection
//! acknowledgement, and hands each inbound message to the command port on
//! its own task.

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};

use remopi_app::ports::{CommandHandler, CommandOutcome};
use remopi_app::shutdown::ShutdownSignal;
use remopi_domain::error::RemoPiError;

use crate::config::MqttConfig;
use crate::error::MqttError;
use crate::publisher::{MqttCommandPublisher, MqttStatusPublisher};
use crate::topics::{Inbound, Topics};

const REQUEST_CAPACITY: usize = 32;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Connection to the broker, consumed by [`MqttBridge::run`].
pub struct MqttBridge {
    client: AsyncClient,
    eventloop: EventLoop,
    topics: Topics,
    follow_status: bool,
    relay_commands: bool,
}

impl MqttBridge {
    /// Prepare a client. Nothing touches the network until [`MqttBridge::run`].
    #[must_use]
    pub fn new(config: &MqttConfig) -> Self {
        let (client, eventloop) = AsyncClient::new(config.options(), REQUEST_CAPACITY);
        Self {
            client,
            eventloop,
            topics: Topics::new(config.base_topic.clone()),
            follow_status: config.follow_status,
            relay_commands: config.relay_commands,
        }
    }

    /// Publisher sharing this bridge's connection.
    #[must_use]
    pub fn publisher(&self) -> MqttStatusPublisher {
        MqttStatusPublisher::new(self.client.clone(), self.topics.clone())
    }

    /// Command publisher sharing this bridge's connection.
    #[must_use]
    pub fn commands(&self) -> MqttCommandPublisher {
        MqttCommandPublisher::new(self.client.clone(), self.topics.clone())
    }

    /// Run until shutdown. Connection errors are retried after a delay.
    pub async fn run<H: CommandHandler>(mut self, handler: Arc<H>, mut shutdown: ShutdownSignal) {
        tracing::info!(commands = %self.topics.command_filter(), "mqtt bridge started");
        loop {
            tokio::select! {
                event = self.eventloop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        tracing::info!("connected to mqtt broker");
                        if let Err(err) = Self::subscribe(&self.client, &self.topics, self.relay_commands, self.follow_status).await {
                            tracing::warn!(error = %err, "mqtt subscribe failed");
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(message))) => {
                        self.dispatch(&handler, &message.topic, &message.payload);
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(error = %MqttError::Connection(err), "mqtt connection lost, retrying");
                        tokio::select! {
                            () = tokio::time::sleep(RECONNECT_DELAY) => {}
                            () = shutdown.wait() => break,
                        }
                    }
                },
                () = shutdown.wait() => break,
            }
        }
        if let Err(err) = self.client.try_disconnect() {
            tracing::debug!(error = %err, "mqtt disconnect not sent");
        }
        tracing::info!("mqtt bridge stopped");
    }

    async fn subscribe(
        client: &AsyncClient,
        topics: &Topics,
        relay_commands: bool,
        follow_status: bool,
    ) -> Result<(), MqttError> {
        if !relay_commands {
            client
                .subscribe(topics.command_filter(), QoS::AtLeastOnce)
                .await
                .map_err(MqttError::Client)?;
        }
        if follow_status {
            client
                .subscribe(topics.status_filter(), QoS::AtLeastOnce)
                .await
                .map_err(MqttError::Client)?;
        }
        Ok(())
    }

    fn dispatch<H: CommandHandler>(&self, handler: &Arc<H>, topic: &str, payload: &[u8]) {
        let inbound = match self.topics.decode(topic, payload) {
            Ok(inbound) => inbound,
            Err(err) => {
                tracing::warn!(%topic, error = %err, "ignoring mqtt message");
                return;
            }
        };
        let wanted = match inbound {
            Inbound::Command { .. } => !self.relay_commands,
            Inbound::Status { .. } => self.follow_status,
        };
        if !wanted {
            return;
        }
        let handler = Arc::clone(handler);
        tokio::spawn(async move {
            if let Err(err) = handle_inbound(handler.as_ref(), inbound).await {
                tracing::warn!(error = %err, "mqtt message failed");
            }
        });
    }
}

/// Apply one decoded message through the command port.
///
/// # Errors
///
/// Returns the command port's error.
pub async fn handle_inbound<H: CommandHandler>(handler: &H, inbound: Inbound) -> Result<(), RemoPiError> {
    match inbound {
        Inbound::Command { id, button } => {
            let outcome = handler.execute(&id, button.clone()).await?;
            match outcome {
                CommandOutcome::Executed => {
                    tracing::info!(appliance_id = %id, %button, "mqtt command executed");
                }
                CommandOutcome::Ignored => {
                    tracing::info!(appliance_id = %id, %button, "mqtt command gated");
                }
            }
            Ok(())
        }
        Inbound::Status { id, power } => handler.apply_remote_status(&id, power).await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use remopi_domain::button::Button;
    use remopi_domain::error::NotFoundError;
    use remopi_domain::id::ApplianceId;
    use remopi_domain::level::PowerState;

    #[derive(Default)]
    struct RecordingHandler {
        seen: Mutex<Vec<String>>,
    }

    impl CommandHandler for RecordingHandler {
        async fn execute(&self, id: &ApplianceId, button: Button) -> Result<CommandOutcome, RemoPiError> {
            if id.as_str() == "ghost" {
                return Err(NotFoundError {
                    entity: "Appliance",
                    id: id.to_string(),
                }
                .into());
            }
            self.seen.lock().unwrap().push(format!("execute {id} {button}"));
            Ok(CommandOutcome::Executed)
        }

        async fn status(&self, _id: &ApplianceId) -> Result<PowerState, RemoPiError> {
            Ok(PowerState::Off)
        }

        async fn apply_remote_status(&self, id: &ApplianceId, power: PowerState) -> Result<(), RemoPiError> {
            self.seen.lock().unwrap().push(format!("status {id} {power}"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn should_route_commands_and_statuses() {
        let handler = RecordingHandler::default();
        let topics = Topics::new("remo");

        let command = topics.decode("remo/command/lamp", br#"{"button":"on"}"#).unwrap();
        handle_inbound(&handler, command).await.unwrap();
        let status = topics.decode("remo/status/lamp", br#"{"power_state":true}"#).unwrap();
        handle_inbound(&handler, status).await.unwrap();

        assert_eq!(
            *handler.seen.lock().unwrap(),
            vec!["execute lamp on".to_string(), "status lamp on".to_string()]
        );
    }

    #[tokio::test]
    async fn should_surface_handler_errors() {
        let handler = RecordingHandler::default();
        let command = Topics::new("remo")
            .decode("remo/command/ghost", br#"{"button":"on"}"#)
            .unwrap();

        let result = handle_inbound(&handler, command).await;

        assert!(matches!(result, Err(RemoPiError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_build_bridge_without_connecting() {
        let bridge = MqttBridge::new(&MqttConfig::default());
        assert_eq!(bridge.topics, Topics::new("remo"));
        assert!(!bridge.follow_status);
        assert!(!bridge.relay_commands);
    }

    #[tokio::test]
    async fn should_execute_command_relayed_by_another_node() {
        let handler = RecordingHandler::default();
        let topics = Topics::new("remo");
        let relayed = crate::topics::encode_command(&Button::Toggle).unwrap();

        let command = topics.decode(&topics.command(&ApplianceId::new("lamp").unwrap()), &relayed).unwrap();
        handle_inbound(&handler, command).await.unwrap();

        assert_eq!(*handler.seen.lock().unwrap(), vec!["execute lamp toggle".to_string()]);
    }
}
