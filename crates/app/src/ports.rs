//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod command;
pub mod gpio;
pub mod metrics;
pub mod peer;
pub mod remo_api;
pub mod status;

pub use command::{CommandHandler, CommandOutcome, CommandPublisher};
pub use gpio::{Gpio, InputPin, OutputPin};
pub use metrics::MetricsRecorder;
pub use peer::{PeerClient, PeerError, PeerResolver};
pub use remo_api::{CloudAppliance, RemoApi};
pub use status::StatusPublisher;
