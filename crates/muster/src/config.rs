//! Configuration management for muster.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::fmt;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "muster";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "checkins.db";

/// Default community roster export.
const ROSTER_FILE_NAME: &str = "groupExportAll_FBS_Community.csv";

/// Default staff and faculty exports, in load order.
const STAFF_FILE_NAMES: &[&str] = &[
    "groupExportAll_FBS_StaffAll.csv",
    "groupExportAll_FBS_Faculty_Core.csv",
    "groupExportAll_FBS_Faculty_Adjunct.csv",
    "groupExportAll_FBS_Faculty_Affiliated.csv",
];

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `MUSTER_`, `__` between sections)
/// 2. TOML config file at `~/.config/muster/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Roster and membership export configuration.
    pub directory: DirectoryConfig,
    /// Check-in store configuration.
    pub storage: StorageConfig,
}

/// Where the roster and staff/faculty exports live and how to read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Path to the community roster export.
    /// Defaults to `~/.local/share/muster/groupExportAll_FBS_Community.csv`
    pub roster_path: Option<PathBuf>,
    /// Staff and faculty membership exports. Missing files are skipped.
    /// Defaults to the four group exports in the data directory.
    pub staff_paths: Option<Vec<PathBuf>>,
    /// First-column value that marks a repeated header row.
    pub header_token: String,
    /// Substring that marks an embedded group header row.
    pub group_marker: String,
}

/// Which check-in store implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Durable list and counter kept in a `SQLite` database.
    #[default]
    Sqlite,
    /// Process-local list, lost on exit.
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Check-in store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend selection.
    pub backend: StorageBackend,
    /// Path to the database file (sqlite backend only).
    /// Defaults to `~/.local/share/muster/checkins.db`
    pub database_path: Option<PathBuf>,
    /// Key of the check-in list.
    pub list_key: String,
    /// Key of the sequence counter.
    pub counter_key: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            roster_path: None,
            staff_paths: None,
            header_token: "uid".to_string(),
            group_marker: "groups:".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            database_path: None,
            list_key: "alerts".to_string(),
            counter_key: "alert_count".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
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
            .merge(Env::prefixed("MUSTER_").split("__"));

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
        if self.storage.list_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage.list_key must not be empty".to_string(),
            });
        }

        if self.storage.counter_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage.counter_key must not be empty".to_string(),
            });
        }

        if self.storage.list_key == self.storage.counter_key {
            return Err(Error::ConfigValidation {
                message: format!(
                    "storage.list_key and storage.counter_key must differ (both '{}')",
                    self.storage.list_key
                ),
            });
        }

        if self.directory.header_token.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "directory.header_token must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the roster export path, resolving defaults if not set.
    #[must_use]
    pub fn roster_path(&self) -> PathBuf {
        self.directory
            .roster_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(ROSTER_FILE_NAME))
    }

    /// Get the staff and faculty export paths, resolving defaults if not set.
    #[must_use]
    pub fn staff_paths(&self) -> Vec<PathBuf> {
        self.directory.staff_paths.clone().unwrap_or_else(|| {
            let data_dir = Self::default_data_dir();
            STAFF_FILE_NAMES
                .iter()
                .map(|name| data_dir.join(name))
                .collect()
        })
    }
}
