//! # Configuration
//!
//! TOML configuration for the `sololevel` binary.
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//! max_update_attempts = 8
//!
//! [logging]
//! level = "info"
//! file = "sololevel.log"
//!
//! [backup]
//! dir = "./backups"
//! automatic_count = 7
//! keep_manual = true
//! ```
//!
//! Every section and field has a default, so a partial file (or an empty one)
//! is valid. `sololevel init` writes the full default file.
//!
//! ```rust,no_run
//! use sololevel::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("sololevel.toml").await?;
//!     let config = Config::load("sololevel.toml").await?;
//!     println!("store: {}", config.storage.gamestate_path().display());
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::game::storage::DEFAULT_MAX_UPDATE_ATTEMPTS;

pub const DEFAULT_CONFIG_PATH: &str = "sololevel.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub backup: BackupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Compare-and-swap attempts per mutation before reporting a conflict.
    #[serde(default = "default_max_update_attempts")]
    pub max_update_attempts: u32,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_max_update_attempts() -> u32 {
    DEFAULT_MAX_UPDATE_ATTEMPTS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_update_attempts: default_max_update_attempts(),
        }
    }
}

impl StorageConfig {
    /// Location of the sled database.
    pub fn gamestate_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("gamestate")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: Some("sololevel.log".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupConfig {
    #[serde(default = "default_backup_dir")]
    pub dir: String,
    /// Automatic backups kept by `backup prune`; manual ones are governed by `keep_manual`.
    #[serde(default = "default_automatic_count")]
    pub automatic_count: usize,
    #[serde(default = "default_keep_manual")]
    pub keep_manual: bool,
}

fn default_backup_dir() -> String {
    "./backups".to_string()
}

fn default_automatic_count() -> usize {
    7
}

fn default_keep_manual() -> bool {
    true
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: default_backup_dir(),
            automatic_count: default_automatic_count(),
            keep_manual: default_keep_manual(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir cannot be empty"));
        }
        if self.storage.max_update_attempts == 0 {
            return Err(anyhow!("storage.max_update_attempts must be at least 1"));
        }
        if self.backup.dir.trim().is_empty() {
            return Err(anyhow!("backup.dir cannot be empty"));
        }
        Ok(())
    }
}
