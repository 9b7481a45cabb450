//! Status events published whenever an appliance's displayed state changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::appliance::ApplianceKind;
use crate::id::ApplianceId;
use crate::level::PowerState;

/// UTC instant a status was observed at.
pub type Timestamp = DateTime<Utc>;

/// Snapshot of an appliance's power state handed to status observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplianceStatus {
    pub appliance_id: ApplianceId,
    pub appliance_name: String,
    #[serde(rename = "type")]
    pub kind: ApplianceKind,
    /// `true` when on.
    #[serde(with = "power_flag")]
    pub power_state: PowerState,
    pub timestamp: Timestamp,
}

impl ApplianceStatus {
    #[must_use]
    pub fn new(
        appliance_id: ApplianceId,
        appliance_name: impl Into<String>,
        kind: ApplianceKind,
        power_state: PowerState,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            appliance_id,
            appliance_name: appliance_name.into(),
            kind,
            power_state,
            timestamp,
        }
    }

    /// Status stamped with the current time.
    #[must_use]
    pub fn observed_now(
        appliance_id: ApplianceId,
        appliance_name: impl Into<String>,
        kind: ApplianceKind,
        power_state: PowerState,
    ) -> Self {
        Self::new(appliance_id, appliance_name, kind, power_state, Utc::now())
    }
}

/// `power_state` travels as a boolean; `"on"`/`"off"` is still read.
mod power_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::level::PowerState;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Flag(bool),
        Named(PowerState),
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(power: &PowerState, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(power.is_on())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PowerState, D::Error> {
        Ok(match Field::deserialize(deserializer)? {
            Field::Flag(on) => PowerState::from(on),
            Field::Named(power) => power,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn should_serialize_with_wire_field_names() {
        let status = ApplianceStatus::new(
            ApplianceId::new("lamp").unwrap(),
            "Desk lamp",
            ApplianceKind::Light,
            PowerState::On,
            chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        );
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["appliance_id"], "lamp");
        assert_eq!(json["appliance_name"], "Desk lamp");
        assert_eq!(json["type"], "light");
        assert_eq!(json["power_state"], true);
        assert_eq!(json["timestamp"], "2024-01-02T03:04:05Z");
    }

    #[test]
    fn should_read_boolean_and_named_power_state() {
        let flag: ApplianceStatus = serde_json::from_str(
            r#"{"appliance_id":"fan","appliance_name":"Fan","type":"ir","power_state":false,"timestamp":"2024-01-02T03:04:05Z"}"#,
        )
        .unwrap();
        let named: ApplianceStatus = serde_json::from_str(
            r#"{"appliance_id":"fan","appliance_name":"Fan","type":"ir","power_state":"on","timestamp":"2024-01-02T03:04:05Z"}"#,
        )
        .unwrap();
        assert_eq!(flag.power_state, PowerState::Off);
        assert_eq!(named.power_state, PowerState::On);
    }

    #[test]
    fn should_stamp_observed_status_with_current_time() {
        let before = Utc::now();
        let status = ApplianceStatus::observed_now(
            ApplianceId::new("fan").unwrap(),
            "Fan",
            ApplianceKind::InfraredSignal,
            PowerState::Off,
        );
        assert!(status.timestamp >= before);
        assert!(status.timestamp <= Utc::now());
    }
}
