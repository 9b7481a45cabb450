//! Nature Remo adapter error types.

use remopi_domain::error::RemoPiError;

/// Errors raised while talking to the cloud or a LAN emitter.
#[derive(Debug, thiserror::Error)]
pub enum RemoApiError {
    #[error("failed to build http client")]
    Build(#[source] reqwest::Error),

    #[error("request to {endpoint} failed")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} answered {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {endpoint}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl RemoApiError {
    /// HTTP status of a rejected call.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<RemoApiError> for RemoPiError {
    fn from(err: RemoApiError) -> Self {
        RemoPiError::upstream(err)
    }
}
