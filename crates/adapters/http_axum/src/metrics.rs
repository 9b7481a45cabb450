//! Prometheus scrape endpoint.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use remopi_app::ports::CommandHandler;

use crate::state::AppState;

const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// `GET /metrics`
pub async fn metrics<H: CommandHandler>(State(state): State<AppState<H>>) -> Response {
    match &state.metrics {
        Some(metrics) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], metrics.render_prometheus()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
