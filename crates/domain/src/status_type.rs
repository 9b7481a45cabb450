//! Status pin polarity.
//!
//! Every write to a status pin and every read back from it goes through a
//! [`StatusType`], so hardware that lights an LED on a low level (or drives
//! an active-low relay) can share the same logic as straight wiring.

use serde::{Deserialize, Serialize};

use crate::level::{Level, PowerState};

/// Which electrical level means "on" for a status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusType {
    /// High means on.
    #[default]
    #[serde(alias = "STR", alias = "str")]
    Straight,
    /// High means off.
    #[serde(alias = "REV", alias = "rev")]
    Reverse,
}

impl StatusType {
    /// Physical level to write for a logical power state.
    #[must_use]
    pub fn level_for(self, state: PowerState) -> Level {
        self.apply(if state.is_on() { Level::High } else { Level::Low })
    }

    /// Logical power state shown by a physical level.
    #[must_use]
    pub fn power_for(self, level: Level) -> PowerState {
        PowerState::from(self.apply(level).is_high())
    }

    /// Applying the polarity twice is the identity.
    fn apply(self, level: Level) -> Level {
        match self {
            Self::Straight => level,
            Self::Reverse => level.inverted(),
        }
    }
}

impl std::fmt::Display for StatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Straight => f.write_str("straight"),
            Self::Reverse => f.write_str("reverse"),
        }
    }
}
