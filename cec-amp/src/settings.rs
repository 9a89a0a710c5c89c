//! Application settings

use std::path::{Path, PathBuf};

use cec_bridge::BridgeConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors writing the settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine settings path")]
    NoPath,

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),
}

/// CEC adapter process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdapterSettings {
    /// Program to run
    pub program: String,
    /// Arguments passed to the program
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            program: "/usr/bin/cec-client".to_string(),
            args: vec!["--type".into(), "a".into(), "RPI".into()],
        }
    }
}

/// `pigpiod` connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PigpioSettings {
    pub host: String,
    #[serde(default = "default_pigpio_port")]
    pub port: u16,
}

fn default_pigpio_port() -> u16 {
    cec_bridge::pigpio::DEFAULT_PORT
}

impl Default for PigpioSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: default_pigpio_port(),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// CEC adapter process
    #[serde(default)]
    pub adapter: AdapterSettings,
    /// `pigpiod` connection
    #[serde(default)]
    pub pigpio: PigpioSettings,
    /// Bridge behaviour
    #[serde(default)]
    pub bridge: BridgeConfig,
}

impl Settings {
    /// Get the XDG config directory for cec-rc5
    /// Uses $XDG_CONFIG_HOME/cec-rc5, falls back to ~/.config/cec-rc5
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("cec-rc5"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("cec-rc5"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk, defaulting when absent or unreadable
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoPath)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to a specific file, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
