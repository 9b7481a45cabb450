//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`RemoPiError`]
//! via `From` when crossing a port boundary.

use crate::appliance::ApplianceKind;
use crate::trigger::Trigger;

/// Boxed source error carried by the opaque variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Root error type for the remopi core.
#[derive(Debug, thiserror::Error)]
pub enum RemoPiError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("unsupported operation")]
    Unsupported(#[from] UnsupportedError),

    /// A command could not be delivered (cloud API, LAN IR, or peer).
    #[error("upstream command failed")]
    Upstream(#[source] BoxError),

    /// A GPIO pin could not be opened, read, or written.
    #[error("hardware error")]
    Hardware(#[source] BoxError),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("appliance id must not be empty")]
    EmptyId,

    #[error("appliance name must not be empty")]
    EmptyName,

    #[error("appliance kind is required")]
    MissingKind,

    #[error("appliance {0} is configured more than once")]
    DuplicateId(String),

    #[error("appliance {id} must set both switch_pin and status_pin or neither")]
    UnpairedPins { id: String },

    #[error("{kind} appliance {id} requires field `{field}`")]
    MissingField {
        id: String,
        kind: ApplianceKind,
        field: &'static str,
    },

    #[error("invalid duration {0:?}")]
    InvalidDuration(String),

    #[error("button must not be empty")]
    EmptyButton,
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// The request is well-formed but cannot be served for this appliance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnsupportedError {
    #[error("appliance {id} of kind {kind} has no readable status")]
    WrongKind { id: String, kind: ApplianceKind },

    #[error("trigger {trigger} is not supported in relay mode")]
    RelayTrigger { trigger: Trigger },
}

impl RemoPiError {
    /// Wrap any error as an upstream delivery failure.
    pub fn upstream(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Upstream(Box::new(err))
    }

    /// Wrap any error as a hardware failure.
    pub fn hardware(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Hardware(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_root() {
        let err: RemoPiError = ValidationError::EmptyName.into();
        assert!(matches!(err, RemoPiError::Validation(ValidationError::EmptyName)));
    }

    #[test]
    fn should_display_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Appliance",
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Appliance abc not found");
    }

    #[test]
    fn should_display_unpaired_pins() {
        let err = ValidationError::UnpairedPins {
            id: "lamp".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "appliance lamp must set both switch_pin and status_pin or neither"
        );
    }

    #[test]
    fn should_wrap_io_error_as_upstream() {
        let io = std::io::Error::other("connection refused");
        let err = RemoPiError::upstream(io);
        assert!(matches!(err, RemoPiError::Upstream(_)));
        assert_eq!(err.to_string(), "upstream command failed");
    }
}
