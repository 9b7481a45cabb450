//! Control endpoint handler.
//!
//! `GET /?id=<id>&button=<button>` runs a command and answers `200` with an
//! empty body. Without `button` it answers the appliance's power state as a
//! bare `0` / `1` body, which is what relay controllers poll.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use remopi_app::ports::{CommandHandler, CommandOutcome};
use remopi_domain::button::Button;
use remopi_domain::error::{NotFoundError, RemoPiError};
use remopi_domain::id::ApplianceId;
use remopi_domain::level::PowerState;

use crate::error::ApiError;
use crate::state::AppState;

/// Query string of the control endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ControlQuery {
    pub id: Option<String>,
    pub button: Option<String>,
}

/// Possible responses from the control endpoint.
pub enum ControlResponse {
    Executed,
    Status(PowerState),
}

impl IntoResponse for ControlResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Executed => StatusCode::OK.into_response(),
            Self::Status(power) => (StatusCode::OK, power.as_digit()).into_response(),
        }
    }
}

/// `GET /`
pub async fn control<H: CommandHandler>(
    State(state): State<AppState<H>>,
    Query(query): Query<ControlQuery>,
) -> Result<ControlResponse, ApiError> {
    let raw_id = query.id.unwrap_or_default();
    let id = ApplianceId::new(raw_id.as_str()).map_err(|_| {
        RemoPiError::from(NotFoundError {
            entity: "Appliance",
            id: raw_id.clone(),
        })
    })?;

    let Some(button) = query.button.filter(|button| !button.trim().is_empty()) else {
        let power = state.commands.status(&id).await?;
        return Ok(ControlResponse::Status(power));
    };

    let button: Button = button.parse().map_err(RemoPiError::from)?;
    match state.commands.execute(&id, button).await? {
        CommandOutcome::Executed => {}
        CommandOutcome::Ignored => tracing::debug!(appliance_id = %id, "command gated"),
    }
    Ok(ControlResponse::Executed)
}
