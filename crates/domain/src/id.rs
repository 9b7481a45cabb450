//! Typed identifier newtypes.
//!
//! Appliance identifiers are assigned by the cloud service (or chosen by the
//! operator for local-only appliances), so they are opaque strings rather
//! than generated UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier, rejecting empty strings.
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError::EmptyId`] when `raw` is blank.
            pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(ValidationError::EmptyId);
                }
                Ok(Self(raw))
            }

            /// Borrow the raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifier of an [`Appliance`](crate::appliance::Appliance).
    ApplianceId
);

define_id!(
    /// Identifier of a cloud-registered infrared signal.
    SignalId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_roundtrip_through_display_and_from_str() {
        let id = ApplianceId::new("0f1e2d3c").unwrap();
        let parsed: ApplianceId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_reject_blank_identifier() {
        assert_eq!(ApplianceId::new("  "), Err(ValidationError::EmptyId));
        assert!(SignalId::from_str("").is_err());
    }

    #[test]
    fn should_serialize_transparently() {
        let id = SignalId::new("sig-1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"sig-1\"");
    }
}
