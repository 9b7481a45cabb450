//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use remopi_domain::error::RemoPiError;

/// JSON error body returned by the control endpoint.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`RemoPiError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(RemoPiError);

impl From<RemoPiError> for ApiError {
    fn from(err: RemoPiError) -> Self {
        Self(err)
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RemoPiError::NotFound(_) => StatusCode::NOT_FOUND,
            RemoPiError::Validation(_) | RemoPiError::Unsupported(_) => StatusCode::BAD_REQUEST,
            RemoPiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            RemoPiError::Hardware(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            RemoPiError::NotFound(err) => err.to_string(),
            RemoPiError::Validation(err) => err.to_string(),
            RemoPiError::Unsupported(err) => err.to_string(),
            RemoPiError::Upstream(err) => {
                tracing::warn!(error = %err, "command delivery failed");
                format!("upstream command failed: {err}")
            }
            RemoPiError::Hardware(err) => {
                tracing::error!(error = %err, "gpio failure");
                "internal server error".to_string()
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remopi_domain::error::{NotFoundError, UnsupportedError, ValidationError};
    use remopi_domain::trigger::Trigger;

    #[test]
    fn should_map_errors_to_status_codes() {
        let not_found = ApiError::from(RemoPiError::from(NotFoundError {
            entity: "Appliance",
            id: "ghost".to_string(),
        }));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid = ApiError::from(RemoPiError::from(ValidationError::EmptyButton));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let unsupported = ApiError::from(RemoPiError::from(UnsupportedError::RelayTrigger {
            trigger: Trigger::Sync,
        }));
        assert_eq!(unsupported.status(), StatusCode::BAD_REQUEST);

        let upstream = ApiError::from(RemoPiError::upstream(std::io::Error::other("timeout")));
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);

        let hardware = ApiError::from(RemoPiError::hardware(std::io::Error::other("busy")));
        assert_eq!(hardware.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
