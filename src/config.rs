use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{EnvVaultError, Result};

/// Application configuration, stored as JSON under `~/.envvault/`.
///
/// Every field has a default so a missing or partial file never blocks
/// startup; `load` falls back to defaults when the file does not exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding snapshot files.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Tool scan catalog (JSON). Missing file degrades to an empty
    /// catalog at scan time, never an error here.
    #[serde(default = "default_scan_config_path")]
    pub scan_config: PathBuf,

    /// System-tools catalog (JSON). Missing file falls back to the
    /// built-in catalog.
    #[serde(default = "default_tools_config_path")]
    pub tools_config: PathBuf,
}

fn default_backup_dir() -> PathBuf {
    AppConfig::app_dir().join("backups")
}

fn default_scan_config_path() -> PathBuf {
    AppConfig::app_dir().join("scan_config.json")
}

fn default_tools_config_path() -> PathBuf {
    AppConfig::app_dir().join("tools_config.json")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backup_dir: default_backup_dir(),
            scan_config: default_scan_config_path(),
            tools_config: default_tools_config_path(),
        }
    }
}

impl AppConfig {
    /// Per-user application data directory.
    pub fn app_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".envvault")
    }

    pub fn config_path() -> PathBuf {
        Self::app_dir().join("config.json")
    }

    /// Load the config, falling back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| EnvVaultError::Config(format!("Invalid config {}: {}", path.display(), e)))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Set a config key from the CLI. Returns an error naming the valid
    /// keys when the key is unknown.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "backup_dir" => self.backup_dir = PathBuf::from(value),
            "scan_config" => self.scan_config = PathBuf::from(value),
            "tools_config" => self.tools_config = PathBuf::from(value),
            _ => {
                return Err(EnvVaultError::Config(format!(
                    "Unknown key '{}'. Valid keys: backup_dir, scan_config, tools_config",
                    key
                )))
            }
        }
        Ok(())
    }

    /// Ensure the backup directory exists, creating it if necessary.
    pub fn ensure_backup_dir(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.backup_dir)?;
        Ok(self.backup_dir.clone())
    }
}
