//! Status and command publishers writing to the broker.

use rumqttc::{AsyncClient, QoS};

use remopi_app::ports::{CommandPublisher, StatusPublisher};
use remopi_domain::button::Button;
use remopi_domain::error::RemoPiError;
use remopi_domain::id::ApplianceId;
use remopi_domain::status::ApplianceStatus;

use crate::error::MqttError;
use crate::topics::{Topics, encode_command, encode_status};

/// Publishes status events to `<base>/status/<id>`.
#[derive(Clone)]
pub struct MqttStatusPublisher {
    client: AsyncClient,
    topics: Topics,
}

impl MqttStatusPublisher {
    #[must_use]
    pub fn new(client: AsyncClient, topics: Topics) -> Self {
        Self { client, topics }
    }
}

impl StatusPublisher for MqttStatusPublisher {
    async fn publish(&self, status: ApplianceStatus) -> Result<(), RemoPiError> {
        let topic = self.topics.status(&status.appliance_id);
        let payload = encode_status(&status)?;
        self.client
            .publish(&topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(MqttError::Client)?;
        tracing::debug!(%topic, power = %status.power_state, "status published");
        Ok(())
    }
}

/// Publishes commands to `<base>/command/<id>` for another controller.
#[derive(Clone)]
pub struct MqttCommandPublisher {
    client: AsyncClient,
    topics: Topics,
}

impl MqttCommandPublisher {
    #[must_use]
    pub fn new(client: AsyncClient, topics: Topics) -> Self {
        Self { client, topics }
    }
}

impl CommandPublisher for MqttCommandPublisher {
    async fn publish_command(&self, id: &ApplianceId, button: Button) -> Result<(), RemoPiError> {
        let topic = self.topics.command(id);
        let payload = encode_command(&button)?;
        self.client
            .publish(&topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(MqttError::Client)?;
        tracing::debug!(%topic, %button, "command published");
        Ok(())
    }
}
