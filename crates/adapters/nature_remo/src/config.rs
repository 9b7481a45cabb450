//! Cloud API configuration.

use std::time::Duration;

use serde::Deserialize;

/// Connection settings for the Nature Remo cloud.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// API root, without trailing slash.
    pub base_url: String,
    /// Personal access token sent as a bearer token.
    pub token: String,
    /// Per-request timeout in seconds, cloud and LAN alike.
    pub timeout_secs: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.nature.global".to_string(),
            token: String::new(),
            timeout_secs: 10,
        }
    }
}

impl CloudConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudConfig")
            .field("base_url", &self.base_url)
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_public_cloud() {
        let config = CloudConfig::default();
        assert_eq!(config.base_url, "https://api.nature.global");
        assert!(config.token.is_empty());
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn should_deserialize_from_toml() {
        let config: CloudConfig = toml::from_str(r#"token = "abc""#).unwrap();
        assert_eq!(config.token, "abc");
        assert_eq!(config.base_url, "https://api.nature.global");
    }

    #[test]
    fn should_not_print_token() {
        let config = CloudConfig {
            token: "secret".to_string(),
            ..CloudConfig::default()
        };
        assert!(!format!("{config:?}").contains("secret"));
    }
}
