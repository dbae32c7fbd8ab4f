//! Configuration handling
//!
//! Configuration is stored in `config.toml` inside the workspace directory.
//! Every key is optional; missing keys take their defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SortKey;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Order applied when the interactive shell starts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DefaultSort {
    /// Sort key name; unknown names leave the order untouched
    pub key: String,
    pub reverse: bool,
}

impl Default for DefaultSort {
    fn default() -> Self {
        Self {
            key: SortKey::Date.to_string(),
            reverse: false,
        }
    }
}

impl DefaultSort {
    pub fn sort_key(&self) -> Option<SortKey> {
        SortKey::parse(&self.key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Save after every change in the interactive shell
    pub autosave: bool,

    /// Write a timestamped backup before each save
    pub backup_on_save: bool,

    /// Number of backups to keep
    pub backup_keep: usize,

    /// Colorize table output
    pub color: bool,

    /// Maximum number of undo steps
    pub undo_depth: usize,

    /// Look-ahead window, in days, for due-soon reminders
    pub reminder_days: u32,

    pub default_sort: DefaultSort,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autosave: true,
            backup_on_save: true,
            backup_keep: 10,
            color: true,
            undo_depth: 10,
            reminder_days: 3,
            default_sort: DefaultSort::default(),
        }
    }
}

impl Config {
    /// Parses and validates TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.undo_depth == 0 {
            return Err(ConfigError::Invalid(
                "undo_depth must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads the config at `path`.
    ///
    /// A missing file is created with defaults. A file that cannot be parsed
    /// or validated is left alone and defaults are used for this run.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            info!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        match Self::from_toml(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!("{} ({}); using defaults", e, path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = self.to_toml()?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
