//! MQTT adapter error types.

use remopi_domain::error::RemoPiError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The connection to the broker failed.
    #[error("MQTT connection error")]
    Connection(#[source] rumqttc::ConnectionError),

    /// Failed to parse or build an MQTT payload as JSON.
    #[error("failed to parse MQTT payload")]
    Payload(#[source] serde_json::Error),

    /// The topic does not carry an appliance id.
    #[error("unexpected MQTT topic {0:?}")]
    Topic(String),

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[source] RemoPiError),
}

impl MqttError {
    /// Convert into a [`RemoPiError`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> RemoPiError {
        match self {
            Self::Domain(err) => err,
            other => RemoPiError::upstream(other),
        }
    }
}

impl From<MqttError> for RemoPiError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_topic_error() {
        let err = MqttError::Topic("remo/command".to_string());
        assert_eq!(err.to_string(), "unexpected MQTT topic \"remo/command\"");
    }

    #[test]
    fn should_convert_transport_errors_to_upstream() {
        let err: RemoPiError = MqttError::Topic("x".to_string()).into();
        assert!(matches!(err, RemoPiError::Upstream(_)));
    }

    #[test]
    fn should_convert_domain_error_back_to_domain() {
        let domain_err =
            RemoPiError::Validation(remopi_domain::error::ValidationError::EmptyButton);
        let back: RemoPiError = MqttError::Domain(domain_err).into();
        assert!(matches!(back, RemoPiError::Validation(_)));
    }

    #[test]
    fn should_display_payload_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad").unwrap_err();
        let err = MqttError::Payload(json_err);
        assert_eq!(err.to_string(), "failed to parse MQTT payload");
    }
}
