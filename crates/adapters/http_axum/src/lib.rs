//! # remopi-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the control endpoint `GET /?id=<id>&button=<button>` shared by
//!   operators, scripts and relay controllers
//! - Answer status queries (`GET /?id=<id>`) with a bare `0` / `1` body
//! - Expose collected metrics at `GET /metrics` in the Prometheus text format
//! - Map [`RemoPiError`](remopi_domain::error::RemoPiError) into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `remopi-app` (for the [`CommandHandler`](remopi_app::ports::CommandHandler)
//! port) and `remopi-domain`. Never leaks axum types into the core.

pub mod control;
pub mod error;
pub mod metrics;
pub mod router;
pub mod state;
