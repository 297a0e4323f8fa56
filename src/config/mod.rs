// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Configuration module

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Node identity and loop timing
    pub node: NodeConfig,

    /// Alert thresholds
    pub thresholds: ThresholdConfig,

    /// Sensor calibration
    pub sensors: SensorConfig,

    /// WiFi association
    pub network: NetworkConfig,

    /// Cloud session and topics
    pub cloud: CloudConfig,

    /// Local alert profile
    pub alerts: AlertConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Check cross-field invariants that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;

        if self.node.tick_ms == 0 {
            return Err(ConfigError::Invalid("node.tick_ms must be non-zero".into()));
        }
        if self.node.device_id.trim().is_empty() {
            return Err(ConfigError::Invalid("node.device_id must not be empty".into()));
        }
        if self.sensors.battery_full_volts <= self.sensors.battery_empty_volts {
            return Err(ConfigError::Invalid(format!(
                "sensors.battery_full_volts ({}) must exceed battery_empty_volts ({})",
                self.sensors.battery_full_volts, self.sensors.battery_empty_volts
            )));
        }
        if self.sensors.distance_max_cm <= self.sensors.distance_min_cm {
            return Err(ConfigError::Invalid(
                "sensors.distance_max_cm must exceed distance_min_cm".into(),
            ));
        }

        Ok(())
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("aegis-node"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Node identity and loop timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Identifier carried in every outbound payload
    pub device_id: String,

    /// Minimum spacing between telemetry publishes
    pub publish_interval_ms: u64,

    /// Sleep between loop iterations while online
    pub tick_ms: u64,

    /// Sleep between loop iterations in offline mode
    pub offline_tick_ms: u64,

    /// Use the simulated sensor board
    pub demo_mode: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_id: "aegis-one-m5-01".to_string(),
            publish_interval_ms: 5000,
            tick_ms: 100,
            offline_tick_ms: 2000,
            demo_mode: true,
        }
    }
}

/// Fixed alert thresholds.
///
/// Distance thresholds run the other way round: `dist_danger` is the closer,
/// more severe bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub temp_warn: f64,
    pub temp_crit: f64,
    pub vib_warn: f64,
    pub vib_crit: f64,
    pub dist_warn: f64,
    pub dist_danger: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            temp_warn: 35.0,
            temp_crit: 45.0,
            vib_warn: 1.5,
            vib_crit: 2.5,
            dist_warn: 100.0,
            dist_danger: 30.0,
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temp_crit <= self.temp_warn {
            return Err(ConfigError::Invalid(format!(
                "temp_crit ({}) must be greater than temp_warn ({})",
                self.temp_crit, self.temp_warn
            )));
        }
        if self.vib_crit <= self.vib_warn {
            return Err(ConfigError::Invalid(format!(
                "vib_crit ({}) must be greater than vib_warn ({})",
                self.vib_crit, self.vib_warn
            )));
        }
        if self.dist_danger >= self.dist_warn {
            return Err(ConfigError::Invalid(format!(
                "dist_danger ({}) must be less than dist_warn ({})",
                self.dist_danger, self.dist_warn
            )));
        }
        Ok(())
    }
}

/// Sensor calibration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Lower bound (exclusive) of a plausible echo distance
    pub distance_min_cm: f64,

    /// Upper bound (exclusive) of a plausible echo distance
    pub distance_max_cm: f64,

    /// Give up waiting for an echo edge after this long
    pub echo_timeout_us: u64,

    /// Battery voltage reported as 0%
    pub battery_empty_volts: f64,

    /// Battery voltage reported as 100%
    pub battery_full_volts: f64,

    /// Probability that a simulated channel read fails
    pub simulated_fault_rate: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            distance_min_cm: 2.0,
            distance_max_cm: 400.0,
            echo_timeout_us: 30_000,
            battery_empty_volts: 3.2,
            battery_full_volts: 4.2,
            simulated_fault_rate: 0.01,
        }
    }
}

/// WiFi association
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub ssid: String,
    pub password: String,

    /// Association polls before giving up and going offline
    pub connect_attempts: u32,

    /// Delay between association polls
    pub connect_retry_delay_ms: u64,

    /// Skip association entirely and run offline
    pub offline: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: "YOUR_WIFI_SSID".to_string(),
            password: "YOUR_WIFI_PASSWORD".to_string(),
            connect_attempts: 20,
            connect_retry_delay_ms: 1000,
            offline: false,
        }
    }
}

/// Cloud session and topics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    pub enabled: bool,
    pub broker: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub keep_alive_secs: u64,
    pub connect_timeout_ms: u64,

    /// Pause after a dropped link before the session reconnects
    pub reconnect_delay_ms: u64,

    pub telemetry_topic: String,
    pub events_topic: String,
    pub commands_topic: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            broker: "localhost".to_string(),
            port: 1883,
            client_id: "AegisOne_M5_01".to_string(),
            username: None,
            password: None,
            use_tls: false,
            keep_alive_secs: 60,
            connect_timeout_ms: 10_000,
            reconnect_delay_ms: 5000,

            telemetry_topic: "aegisone/telemetry".to_string(),
            events_topic: "aegisone/events".to_string(),
            commands_topic: "aegisone/commands".to_string(),
        }
    }
}

/// Local alert profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Mute tones and haptics; alerts are still logged
    pub muted: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { muted: false }
    }
}
