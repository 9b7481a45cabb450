//! Topic layout and payload codecs.
//!
//! Status events go to `<base>/status/<id>`, commands arrive on
//! `<base>/command/<id>` as `{"button": "..."}`.

use serde::{Deserialize, Serialize};

use remopi_domain::button::Button;
use remopi_domain::id::ApplianceId;
use remopi_domain::level::PowerState;
use remopi_domain::status::ApplianceStatus;

use crate::error::MqttError;

/// Topic names under one base prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    base: String,
}

/// A message received on one of the subscribed topics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Command { id: ApplianceId, button: Button },
    Status { id: ApplianceId, power: PowerState },
}

#[derive(Serialize, Deserialize)]
struct CommandPayload {
    button: String,
}

/// `power_state` is a boolean on the wire; `"on"`/`"off"` is also read.
#[derive(Deserialize)]
#[serde(untagged)]
enum PowerField {
    Flag(bool),
    Named(PowerState),
}

#[derive(Deserialize)]
struct StatusPayload {
    power_state: PowerField,
}

impl Topics {
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn status(&self, id: &ApplianceId) -> String {
        format!("{}/status/{id}", self.base)
    }

    #[must_use]
    pub fn command(&self, id: &ApplianceId) -> String {
        format!("{}/command/{id}", self.base)
    }

    #[must_use]
    pub fn command_filter(&self) -> String {
        format!("{}/command/+", self.base)
    }

    #[must_use]
    pub fn status_filter(&self) -> String {
        format!("{}/status/+", self.base)
    }

    /// Decode a message received on `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Topic`] for topics outside the layout and
    /// [`MqttError::Payload`] / [`MqttError::Domain`] for bad payloads.
    pub fn decode(&self, topic: &str, payload: &[u8]) -> Result<Inbound, MqttError> {
        let rest = topic
            .strip_prefix(self.base.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| MqttError::Topic(topic.to_string()))?;
        let (channel, raw_id) = rest
            .split_once('/')
            .filter(|(_, id)| !id.contains('/'))
            .ok_or_else(|| MqttError::Topic(topic.to_string()))?;
        let id = ApplianceId::new(raw_id).map_err(|_| MqttError::Topic(topic.to_string()))?;

        match channel {
            "command" => {
                let payload: CommandPayload =
                    serde_json::from_slice(payload).map_err(MqttError::Payload)?;
                let button = payload
                    .button
                    .parse::<Button>()
                    .map_err(|err| MqttError::Domain(err.into()))?;
                Ok(Inbound::Command { id, button })
            }
            "status" => {
                let payload: StatusPayload =
                    serde_json::from_slice(payload).map_err(MqttError::Payload)?;
                let power = match payload.power_state {
                    PowerField::Flag(on) => PowerState::from(on),
                    PowerField::Named(power) => power,
                };
                Ok(Inbound::Status { id, power })
            }
            _ => Err(MqttError::Topic(topic.to_string())),
        }
    }
}

/// JSON body of a command, `{"button": "..."}`.
///
/// # Errors
///
/// Returns [`MqttError::Payload`] when serialization fails.
pub fn encode_command(button: &Button) -> Result<Vec<u8>, MqttError> {
    let payload = CommandPayload {
        button: button.to_string(),
    };
    serde_json::to_vec(&payload).map_err(MqttError::Payload)
}

/// JSON body of a status event.
///
/// # Errors
///
/// Returns [`MqttError::Payload`] when serialization fails.
pub fn encode_status(status: &ApplianceStatus) -> Result<Vec<u8>, MqttError> {
    serde_json::to_vec(status).map_err(MqttError::Payload)
}
