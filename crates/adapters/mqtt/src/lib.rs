//! # remopi-adapter-mqtt
//!
//! MQTT adapter built on [rumqttc](https://docs.rs/rumqttc).
//!
//! ## Responsibilities
//! - Publish every [`ApplianceStatus`](remopi_domain::status::ApplianceStatus)
//!   as JSON on `<base>/status/<id>`
//! - Accept `{"button": "..."}` commands on `<base>/command/<id>` and run them
//!   through the [`CommandHandler`](remopi_app::ports::CommandHandler) port
//! - Optionally publish switch presses as `{"button": "toggle"}` commands
//!   for a controller that owns the cloud link
//! - Optionally follow status events of other controllers and mirror them
//!   onto local status pins
//!
//! ## Dependency rule
//! Same as other adapters: depends on `remopi-app` and `remopi-domain`.

pub mod bridge;
pub mod config;
pub mod error;
pub mod publisher;
pub mod topics;

pub use bridge::MqttBridge;
pub use config::MqttConfig;
pub use publisher::{MqttCommandPublisher, MqttStatusPublisher};
