//! # remopi-adapter-nature-remo
//!
//! [`RemoApi`](remopi_app::ports::RemoApi) implementation over HTTP.
//!
//! ## Responsibilities
//! - Cloud calls with a bearer token: light and TV buttons, learned signals,
//!   and the appliance listing used by the reconciler
//! - LAN calls: raw IR codes posted to `http://<ip>/messages`
//! - Record every call (endpoint, status code, duration) through the
//!   [`MetricsRecorder`](remopi_app::ports::MetricsRecorder) port
//!
//! ## Dependency rule
//! Depends on `remopi-app` and `remopi-domain`. Wire types stay private to
//! this crate.

pub mod client;
pub mod config;
pub mod error;
mod wire;

pub use client::NatureRemoClient;
pub use config::CloudConfig;
pub use error::RemoApiError;
