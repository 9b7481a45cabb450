//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use remopi_app::ports::CommandHandler;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Serves the control endpoint at `/`, metrics at `/metrics` and a
/// liveness check at `/health`.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<H: CommandHandler>(state: AppState<H>) -> Router {
    Router::new()
        .route("/", get(crate::control::control::<H>))
        .route("/metrics", get(crate::metrics::metrics::<H>))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
