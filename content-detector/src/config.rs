//! Configuration management for the content detector.
//!
//! Loads configuration from TOML files and provides runtime defaults.

use crate::types::DetectorError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether the detector service is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: default_log_level(),
        }
    }
}

/// Options for a single detector instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Quiet period after the last edit before extracting
    #[serde(default = "default_debounce_delay")]
    pub debounce_delay_ms: u64,

    /// Paragraphs kept on each side of the focus paragraph
    #[serde(default = "default_context_radius")]
    pub context_radius: usize,

    /// Number of content snapshots retained
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Results buffered per subscriber before it starts lagging
    #[serde(default = "default_result_buffer")]
    pub result_buffer: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            debounce_delay_ms: default_debounce_delay(),
            context_radius: default_context_radius(),
            history_capacity: default_history_capacity(),
            result_buffer: default_result_buffer(),
        }
    }
}

impl DetectionConfig {
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    /// Reject settings the detector cannot run with
    pub fn validate(&self) -> Result<(), DetectorError> {
        if self.history_capacity == 0 {
            return Err(DetectorError::InvalidConfig(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.result_buffer == 0 {
            return Err(DetectorError::InvalidConfig(
                "result_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the Unix socket editors connect to
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_debounce_delay() -> u64 {
    500
}

fn default_context_radius() -> usize {
    3
}

fn default_history_capacity() -> usize {
    10
}

fn default_result_buffer() -> usize {
    32
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("/tmp/content-detector.sock")
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Self {
        Self::load_from_path(&Self::default_config_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("content-detector")
            .join("config.toml")
    }

    /// Save configuration to the default path
    pub fn save(&self) -> std::io::Result<()> {
        self.save_to_path(&Self::default_config_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;

        std::fs::write(path, contents)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DetectorError> {
        self.detection.validate()
    }
}
