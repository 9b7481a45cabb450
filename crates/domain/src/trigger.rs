//! Trigger — how edges on a switch pin are turned into commands.

use serde::{Deserialize, Serialize};

use crate::level::Level;

/// Interpretation mode applied to physical switch edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// A rising edge flips the appliance; falling edges are ignored.
    #[default]
    #[serde(alias = "TOGGLE")]
    Toggle,
    /// The appliance follows the switch level: high is on, low is off.
    #[serde(alias = "SYNC")]
    Sync,
    /// A rising edge turns the appliance on and (re)arms a delayed off.
    #[serde(alias = "TIMER")]
    Timer,
}

impl Trigger {
    /// Whether an edge to `level` is acted upon at all.
    #[must_use]
    pub fn accepts(self, level: Level) -> bool {
        match self {
            Self::Toggle | Self::Timer => level.is_high(),
            Self::Sync => true,
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toggle => f.write_str("toggle"),
            Self::Sync => f.write_str("sync"),
            Self::Timer => f.write_str("timer"),
        }
    }
}
