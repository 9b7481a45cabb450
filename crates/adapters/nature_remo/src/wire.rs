//! JSON shapes returned by the cloud API.

use serde::Deserialize;

use remopi_app::ports::CloudAppliance;
use remopi_domain::id::ApplianceId;
use remopi_domain::level::PowerState;

#[derive(Debug, Deserialize)]
pub(crate) struct LightState {
    #[serde(default)]
    pub power: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Light {
    pub state: LightState,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Appliance {
    pub id: String,
    #[serde(default)]
    pub light: Option<Light>,
}

impl Appliance {
    /// `None` when the cloud reports an empty id.
    pub(crate) fn into_cloud(self) -> Option<CloudAppliance> {
        let id = ApplianceId::new(self.id).ok()?;
        Some(CloudAppliance {
            id,
            light_power: self
                .light
                .map(|light| PowerState::from_power_field(&light.state.power)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_read_light_power_from_listing() {
        let listing: Vec<Appliance> = serde_json::from_str(
            r#"[
                {"id":"lamp","nickname":"Lamp","type":"LIGHT","light":{"buttons":[],"state":{"brightness":"100","power":"on","last_button":"on"}}},
                {"id":"aircon","type":"AC","aircon":{}},
                {"id":"","type":"IR"}
            ]"#,
        )
        .unwrap();

        let cloud: Vec<CloudAppliance> = listing.into_iter().filter_map(Appliance::into_cloud).collect();

        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud[0].light_power, Some(PowerState::On));
        assert_eq!(cloud[1].id.as_str(), "aircon");
        assert_eq!(cloud[1].light_power, None);
    }
}
