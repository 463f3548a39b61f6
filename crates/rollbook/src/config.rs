//! Configuration management for rollbook.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::WriteOptions;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "rollbook";

/// Default backing file name.
const DATA_FILE_NAME: &str = "students.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ROLLBOOK_`)
/// 2. TOML config file at `~/.config/rollbook/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Display configuration.
    pub display: DisplayConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the backing file.
    /// Defaults to `~/.local/share/rollbook/students.json`
    pub data_file: Option<PathBuf>,
    /// Replace the backing file via a temporary file and rename.
    pub atomic_writes: bool,
    /// Indent the backing file.
    pub pretty: bool,
}

/// Display-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// `strftime` format for the day shown in headings.
    pub date_format: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: None, // Will be resolved to default at runtime
            atomic_writes: true,
            pretty: true,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: "%B %d, %Y".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `ROLLBOOK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("ROLLBOOK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.storage.data_file {
            if path.as_os_str().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "data_file cannot be empty".to_string(),
                });
            }
        }

        if self.display.date_format.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "date_format cannot be empty".to_string(),
            });
        }

        if StrftimeItems::new(&self.display.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::ConfigValidation {
                message: format!("invalid date_format: {}", self.display.date_format),
            });
        }

        Ok(())
    }

    /// Get the backing file path, resolving defaults if not set.
    #[must_use]
    pub fn data_file(&self) -> PathBuf {
        self.storage
            .data_file
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATA_FILE_NAME))
    }

    /// Create the default data directory when no data file is configured.
    ///
    /// A configured data file is left alone, so a mistyped directory shows up
    /// as a write error instead of a fresh empty tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryCreate`] if the directory cannot be created.
    pub fn create_default_data_dir(&self) -> Result<()> {
        if self.storage.data_file.is_some() {
            return Ok(());
        }
        create_dir(&Self::default_data_dir())
    }

    /// Get the write options for the record store.
    #[must_use]
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            atomic: self.storage.atomic_writes,
            pretty: self.storage.pretty,
        }
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
        path: dir.to_path_buf(),
        source,
    })
}
