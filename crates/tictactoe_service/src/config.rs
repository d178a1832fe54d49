//! Service configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Top-level service configuration. Every section and field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP listener.
    #[serde(default)]
    http: HttpConfig,

    /// Outbound event plane.
    #[serde(default)]
    event_plane: EventPlaneSettings,

    /// Session lifetime.
    #[serde(default)]
    sessions: SessionSettings,

    /// Automated opponent.
    #[serde(default)]
    automated_player: AutomatedPlayerSettings,
}

/// Where the HTTP API listens.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,
}

/// Broker and topic settings for published events.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct EventPlaneSettings {
    /// Whether events are forwarded to the broker.
    #[serde(default = "default_enabled")]
    enabled: bool,

    /// Broker host name, also handed to clients.
    #[serde(default = "default_broker_address")]
    broker_address: String,

    /// Broker port, also handed to clients.
    #[serde(default = "default_broker_port")]
    broker_port: u16,

    /// First segment of every topic.
    #[serde(default = "default_topic_domain")]
    topic_domain: String,

    /// MQTT keep-alive interval in seconds.
    #[serde(default = "default_keep_alive_secs")]
    keep_alive_secs: u64,

    /// Events buffered per subscriber before the slowest one starts losing them.
    #[serde(default = "default_channel_capacity")]
    channel_capacity: usize,
}

/// Session lifetime. A zero idle TTL or cleanup interval disables the idle sweep.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Sessions idle for longer than this are ended.
    #[serde(default = "default_idle_ttl_secs")]
    idle_ttl_secs: u64,

    /// How often the sweep runs.
    #[serde(default = "default_cleanup_interval_secs")]
    cleanup_interval_secs: u64,

    /// How long an ended session id is remembered, so repeated ends succeed.
    #[serde(default = "default_tombstone_ttl_secs")]
    tombstone_ttl_secs: u64,
}

/// Settings for the automated opponent.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct AutomatedPlayerSettings {
    /// Display name shown to the human.
    #[serde(default = "default_automated_name")]
    display_name: String,

    /// Fixed random seed for reproducible play.
    #[serde(default)]
    seed: Option<u64>,
}

#[instrument]
fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[instrument]
fn default_port() -> u16 {
    50020
}

#[instrument]
fn default_enabled() -> bool {
    true
}

#[instrument]
fn default_broker_address() -> String {
    "test.mosquitto.org".to_string()
}

#[instrument]
fn default_broker_port() -> u16 {
    1883
}

#[instrument]
fn default_topic_domain() -> String {
    "RustMadeEasy.com".to_string()
}

#[instrument]
fn default_keep_alive_secs() -> u64 {
    60
}

#[instrument]
fn default_channel_capacity() -> usize {
    256
}

#[instrument]
fn default_idle_ttl_secs() -> u64 {
    3600
}

#[instrument]
fn default_cleanup_interval_secs() -> u64 {
    1800
}

#[instrument]
fn default_tombstone_ttl_secs() -> u64 {
    3600
}

#[instrument]
fn default_automated_name() -> String {
    "Reema".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for EventPlaneSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            broker_address: default_broker_address(),
            broker_port: default_broker_port(),
            topic_domain: default_topic_domain(),
            keep_alive_secs: default_keep_alive_secs(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            tombstone_ttl_secs: default_tombstone_ttl_secs(),
        }
    }
}

impl Default for AutomatedPlayerSettings {
    fn default() -> Self {
        Self {
            display_name: default_automated_name(),
            seed: None,
        }
    }
}

impl SessionSettings {
    /// Idle time-to-live, `None` when eviction is disabled.
    pub fn idle_ttl(&self) -> Option<Duration> {
        (self.idle_ttl_secs > 0).then(|| Duration::from_secs(self.idle_ttl_secs))
    }

    /// How long ended session ids are remembered.
    pub fn tombstone_ttl(&self) -> Duration {
        Duration::from_secs(self.tombstone_ttl_secs)
    }

    /// Sweep interval, `None` when eviction is disabled.
    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.cleanup_interval_secs > 0).then(|| Duration::from_secs(self.cleanup_interval_secs))
    }
}

impl ServiceConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(port = config.http.port, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the configuration as TOML.
    #[instrument(skip(self))]
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::new(format!("Failed to render config: {}", e)))
    }

    /// Applies command-line overrides.
    #[instrument(skip(self))]
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        no_event_plane: bool,
    ) -> Self {
        if let Some(host) = host {
            self.http.host = host;
        }
        if let Some(port) = port {
            self.http.port = port;
        }
        if no_event_plane {
            self.event_plane.enabled = false;
        }
        self
    }

    /// Rejects values the service cannot run with.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_plane.channel_capacity == 0 {
            return Err(ConfigError::new(
                "event_plane.channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.sessions.tombstone_ttl_secs == 0 {
            return Err(ConfigError::new(
                "sessions.tombstone_ttl_secs must be at least 1".to_string(),
            ));
        }
        if self.event_plane.topic_domain.trim().is_empty() {
            return Err(ConfigError::new(
                "event_plane.topic_domain must not be empty".to_string(),
            ));
        }
        if self.automated_player.display_name.trim().is_empty() {
            return Err(ConfigError::new(
                "automated_player.display_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
