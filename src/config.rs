//! Panel configuration loaded from a TOML file.
//!
//! Every section is optional; a missing file yields the defaults.
//!
//! ```toml
//! [keyboard]
//! base_note = 48
//!
//! [controls]
//! attack = 0.05
//! fm_amount = 2.5
//!
//! [host]
//! note_interval_ms = 150
//! pattern = [48, 52, 55]
//! ```

use crate::bridge::{events, HostSettings};
use crate::keyboard::{DEFAULT_BASE_NOTE, KEY_COUNT};
use crate::midi::MAX_NOTE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory name under the platform config dir.
const APP_DIR: &str = "synthpanel";
const CONFIG_FILE: &str = "config.toml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Keyboard display settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Note of the leftmost key.
    pub base_note: u8,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            base_note: DEFAULT_BASE_NOTE,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub keyboard: KeyboardConfig,
    /// Initial slider values keyed by control event name.
    pub controls: BTreeMap<String, f64>,
    pub host: HostSettings,
}

impl Config {
    /// Default config path: `<config_dir>/synthpanel/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads and validates a config file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Parses and validates config text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Path::new("<inline>"))
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let last_key = self.keyboard.base_note as usize + KEY_COUNT - 1;
        if last_key > MAX_NOTE as usize {
            return Err(ConfigError::Invalid(format!(
                "keyboard.base_note {} puts the top key above note {}",
                self.keyboard.base_note, MAX_NOTE
            )));
        }

        if let Some(name) = self
            .controls
            .keys()
            .find(|name| !events::CONTROL_EVENTS.contains(&name.as_str()))
        {
            return Err(ConfigError::Invalid(format!("unknown control `{}`", name)));
        }

        if let Some((name, value)) = self.controls.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "control `{}` has non-finite value {}",
                name, value
            )));
        }

        match self.host.validate() {
            Some(problem) => Err(ConfigError::Invalid(problem)),
            None => Ok(()),
        }
    }
}
