//! Raw infrared codes emitted over the LAN.

use serde::{Deserialize, Serialize};

/// A raw IR waveform as understood by the local emitter endpoint.
///
/// `data` holds alternating on/off pulse lengths in `format` units
/// (microseconds for `"us"`), `freq` is the carrier in kHz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrSignal {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_freq")]
    pub freq: u32,
    pub data: Vec<u32>,
}

fn default_format() -> String {
    "us".to_string()
}

fn default_freq() -> u32 {
    38
}

impl IrSignal {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
