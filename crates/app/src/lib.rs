//! # remopi-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Gpio` / `InputPin` / `OutputPin` — digital pins
//!   - `RemoApi` — cloud appliance API and LAN infrared emitter
//!   - `PeerClient` / `PeerResolver` — forwarding to another controller
//!   - `StatusPublisher` — downstream status observers
//!   - `MetricsRecorder` — outbound API call measurements
//! - Define **driving/inbound ports**:
//!   - `CommandHandler` — `execute` / `status` used by HTTP and MQTT
//! - Provide the control engine: debouncer, edge queues, trigger
//!   dispatchers, timer registry, mirror client, and reconcilers
//! - Provide **in-process infrastructure** (status bus, metrics recorder,
//!   shutdown signal) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `remopi-domain` only (plus `tokio` for tasks, channels and time).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod debouncer;
pub mod edge_queue;
pub mod metrics;
pub mod ports;
pub mod registry;
pub mod sender;
pub mod services;
pub mod shutdown;
pub mod status_bus;
pub mod timers;

#[cfg(test)]
pub(crate) mod testing;
