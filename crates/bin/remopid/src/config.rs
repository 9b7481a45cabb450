//! Configuration loading — TOML file with environment variable overrides.
//!
//! Reads `remopi.toml` from the working directory, or the file named by
//! `REMOPI_CONFIG`. Every section has defaults so a missing file still
//! yields a runnable (if idle) controller. Environment variables win over
//! file values.

use std::time::Duration;

use remopi_adapter_mqtt::MqttConfig;
use remopi_adapter_nature_remo::CloudConfig;
use remopi_domain::appliance::{Appliance, ApplianceKind, ApplianceVariant, PinNumber};
use remopi_domain::error::ValidationError;
use remopi_domain::id::{ApplianceId, SignalId};
use remopi_domain::ir::IrSignal;
use remopi_domain::status_type::StatusType;
use remopi_domain::trigger::Trigger;
use serde::Deserialize;

const DEFAULT_PATH: &str = "remopi.toml";

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between cloud reconciliation passes.
    #[serde(alias = "CheckInterval")]
    pub check_interval_secs: u64,
    /// HTTP control endpoint; `None` disables it.
    #[serde(alias = "Server")]
    pub server: Option<ServerConfig>,
    /// Peer controller; `Some` switches this process to relay mode.
    pub peer: Option<PeerConfig>,
    pub cloud: CloudConfig,
    pub gpio: GpioConfig,
    pub mqtt: Option<MqttConfig>,
    pub logging: LoggingConfig,
    #[serde(alias = "Appliances")]
    pub appliances: Vec<ApplianceConfig>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    #[serde(alias = "Port")]
    pub port: u16,
}

/// Where the authoritative controller lives.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// Hostname or address; names ending in `.local` go through mDNS.
    #[serde(alias = "Host")]
    pub host: String,
    #[serde(alias = "Port")]
    pub port: u16,
    /// Seconds between status polls of the peer.
    pub poll_interval_secs: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Pin backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpioBackend {
    Sysfs,
    Virtual,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    pub backend: GpioBackend,
    /// Switch sampling period in milliseconds.
    pub poll_interval_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// One `[[appliances]]` entry, flat as written in the file.
///
/// Variant-specific fields are optional here and checked by
/// [`ApplianceConfig::into_appliance`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApplianceConfig {
    #[serde(alias = "ID")]
    pub id: String,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Type", alias = "type")]
    pub kind: Option<ApplianceKind>,
    #[serde(alias = "Trigger")]
    pub trigger: Trigger,
    #[serde(alias = "StatusType")]
    pub status_type: StatusType,
    #[serde(alias = "SwitchPin")]
    pub switch_pin: Option<PinNumber>,
    #[serde(alias = "StatusPin")]
    pub status_pin: Option<PinNumber>,
    #[serde(alias = "ConditionPin")]
    pub condition_pin: Option<PinNumber>,
    /// Delayed-off duration such as `"10s"` or `"1m30s"`.
    #[serde(alias = "Timer")]
    pub timer: Option<String>,
    #[serde(alias = "OnButton")]
    pub on_button: Option<String>,
    #[serde(alias = "OffButton")]
    pub off_button: Option<String>,
    #[serde(alias = "OnSignal")]
    pub on_signal: Option<String>,
    #[serde(alias = "OffSignal")]
    pub off_signal: Option<String>,
    #[serde(alias = "IP")]
    pub ip: Option<String>,
    #[serde(alias = "OnLocal")]
    pub on_local: Option<IrSignal>,
    #[serde(alias = "OffLocal")]
    pub off_local: Option<IrSignal>,
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is malformed, or if the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("REMOPI_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("REMOPI_HOST") {
            self.server.get_or_insert_with(ServerConfig::default).host = val;
        }
        if let Some(port) = var("REMOPI_PORT").and_then(|val| val.parse().ok()) {
            self.server.get_or_insert_with(ServerConfig::default).port = port;
        }
        if let Some(val) = var("REMOPI_PEER_HOST") {
            self.peer.get_or_insert_with(PeerConfig::default).host = val;
        }
        if let Some(val) = var("REMOPI_CLOUD_URL") {
            self.cloud.base_url = val;
        }
        if let Some(val) = var("REMOPI_CLOUD_TOKEN") {
            self.cloud.token = val;
        }
        if let Some(val) = var("REMOPI_MQTT_HOST") {
            self.mqtt.get_or_insert_with(MqttConfig::default).broker_host = val;
        }
        match var("REMOPI_GPIO_BACKEND").as_deref() {
            Some("sysfs") => self.gpio.backend = GpioBackend::Sysfs,
            Some("virtual") => self.gpio.backend = GpioBackend::Virtual,
            _ => {}
        }
        if let Some(val) = var("REMOPI_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "check_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.gpio.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "gpio.poll_interval_ms must be non-zero".to_string(),
            ));
        }
        if let Some(server) = &self.server
            && server.port == 0
        {
            return Err(ConfigError::Validation("server.port must be non-zero".to_string()));
        }
        if let Some(peer) = &self.peer {
            if peer.host.trim().is_empty() {
                return Err(ConfigError::Validation("peer.host must be set".to_string()));
            }
            if peer.poll_interval_secs == 0 {
                return Err(ConfigError::Validation(
                    "peer.poll_interval_secs must be non-zero".to_string(),
                ));
            }
            if peer.timeout_secs == 0 {
                return Err(ConfigError::Validation(
                    "peer.timeout_secs must be non-zero".to_string(),
                ));
            }
        }
        self.appliances()?;
        Ok(())
    }

    /// Build the domain appliances, rejecting invalid entries.
    ///
    /// # Errors
    ///
    /// Returns the first entry's [`ValidationError`].
    pub fn appliances(&self) -> Result<Vec<Appliance>, ValidationError> {
        self.appliances
            .iter()
            .cloned()
            .map(ApplianceConfig::into_appliance)
            .collect()
    }

    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

impl ServerConfig {
    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl PeerConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl GpioConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl ApplianceConfig {
    /// Resolve the flat entry into a validated [`Appliance`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingKind`] without a kind,
    /// [`ValidationError::MissingField`] when the kind's own fields are
    /// absent, or whatever [`Appliance::validate`] rejects.
    pub fn into_appliance(self) -> Result<Appliance, ValidationError> {
        let id = ApplianceId::new(self.id)?;
        let kind = self.kind.ok_or(ValidationError::MissingKind)?;
        let missing = |field: &'static str| ValidationError::MissingField {
            id: id.to_string(),
            kind,
            field,
        };

        let variant = match kind {
            ApplianceKind::Light => ApplianceVariant::Light {
                on_button: self.on_button,
                off_button: self.off_button,
            },
            ApplianceKind::Tv => ApplianceVariant::Tv {
                on_button: self.on_button,
                off_button: self.off_button,
            },
            ApplianceKind::InfraredSignal => ApplianceVariant::InfraredSignal {
                on_signal: SignalId::new(self.on_signal.ok_or_else(|| missing("on_signal"))?)?,
                off_signal: SignalId::new(self.off_signal.ok_or_else(|| missing("off_signal"))?)?,
            },
            ApplianceKind::LocalInfrared => ApplianceVariant::LocalInfrared {
                ip: self.ip.ok_or_else(|| missing("ip"))?,
                on_local: self.on_local.ok_or_else(|| missing("on_local"))?,
                off_local: self.off_local.ok_or_else(|| missing("off_local"))?,
            },
        };

        let mut builder = Appliance::builder()
            .id(id)
            .name(self.name)
            .variant(variant)
            .trigger(self.trigger)
            .status_type(self.status_type)
            .switch_pin(self.switch_pin)
            .status_pin(self.status_pin)
            .condition_pin(self.condition_pin);
        if let Some(timer) = self.timer {
            builder = builder.timer(timer);
        }
        builder.build()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            check_interval_secs: 20,
            server: None,
            peer: None,
            cloud: CloudConfig::default(),
            gpio: GpioConfig::default(),
            mqtt: None,
            logging: LoggingConfig::default(),
            appliances: Vec::new(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 8080,
            poll_interval_secs: 5,
            timeout_secs: 5,
        }
    }
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            backend: GpioBackend::Sysfs,
            poll_interval_ms: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "remopid=info,remopi=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// An appliance entry is invalid.
    #[error("invalid appliance")]
    Appliance(#[from] ValidationError),
}
