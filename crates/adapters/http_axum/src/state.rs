//! Shared application state for axum handlers.

use std::sync::Arc;

use remopi_app::metrics::InMemoryMetrics;
use remopi_app::ports::CommandHandler;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so the handler itself does not need to
/// be `Clone`; only the `Arc` is cloned.
pub struct AppState<H> {
    /// Command service backing the control endpoint.
    pub commands: Arc<H>,
    /// Aggregates served at `/metrics`; absent means the route answers 404.
    pub metrics: Option<Arc<InMemoryMetrics>>,
}

impl<H> Clone for AppState<H> {
    fn clone(&self) -> Self {
        Self {
            commands: Arc::clone(&self.commands),
            metrics: self.metrics.clone(),
        }
    }
}

impl<H: CommandHandler> AppState<H> {
    pub fn new(commands: H) -> Self {
        Self::from_shared(Arc::new(commands))
    }

    /// Wrap a handler that is already shared with other adapters.
    pub fn from_shared(commands: Arc<H>) -> Self {
        Self {
            commands,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<InMemoryMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}
