use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::clients::ErrorReporting;
use crate::constants::{APP_NAME, storage};
use crate::services::{SalePolicy, SaleStrategy};

/// Environment variables that override the service addresses and storage.
pub mod env {
    pub const USERS_URL: &str = "DEALERSHIP_USERS_URL";
    pub const VEHICLES_URL: &str = "DEALERSHIP_VEHICLES_URL";
    pub const PURCHASES_URL: &str = "DEALERSHIP_PURCHASES_URL";
    pub const STORAGE_PATH: &str = "DEALERSHIP_STORAGE_PATH";
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must use http or https: {value}")]
    UnsupportedScheme { field: &'static str, value: String },

    #[error("sales.max_attempts must be at least 1")]
    NoAttempts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub services: ServicesConfig,

    pub notifications: NotificationsConfig,

    pub sales: SalesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// File holding the session token between runs.
    pub storage_path: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        let storage_path = dirs::data_dir().map_or_else(
            || PathBuf::from(storage::FILE_NAME),
            |dir| dir.join(APP_NAME).join(storage::FILE_NAME),
        );

        Self {
            log_level: "info".to_string(),
            storage_path: storage_path.to_string_lossy().into_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub users_url: String,

    pub vehicles_url: String,

    pub purchases_url: String,

    /// Per-request timeout. 0 waits as long as the backend takes.
    pub request_timeout_seconds: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            users_url: "http://localhost:3309/api/users".to_string(),
            vehicles_url: "http://localhost:3303/api/vehiculos".to_string(),
            purchases_url: "http://localhost:3310/api/compras".to_string(),
            request_timeout_seconds: 0,
        }
    }
}

impl ServicesConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub error_reporting: ErrorReporting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesConfig {
    pub strategy: SaleStrategy,

    pub max_attempts: u32,

    pub base_delay_ms: u64,

    pub max_delay_ms: u64,
}

impl Default for SalesConfig {
    fn default() -> Self {
        let policy = SalePolicy::default();
        Self {
            strategy: policy.strategy,
            max_attempts: policy.max_attempts,
            base_delay_ms: u64::try_from(policy.base_delay.as_millis()).unwrap_or(u64::MAX),
            max_delay_ms: u64::try_from(policy.max_delay.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl From<&SalesConfig> for SalePolicy {
    fn from(config: &SalesConfig) -> Self {
        Self {
            strategy: config.strategy,
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.base_delay_ms)),
        }
    }
}

impl Config {
    /// Loads the first config file found, or defaults, then applies
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its
    /// value. Blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(env::USERS_URL) {
            self.services.users_url = url;
        }
        if let Some(url) = get(env::VEHICLES_URL) {
            self.services.vehicles_url = url;
        }
        if let Some(url) = get(env::PURCHASES_URL) {
            self.services.purchases_url = url;
        }
        if let Some(path) = get(env::STORAGE_PATH) {
            self.general.storage_path = path;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_NAME).join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{APP_NAME}")).join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes `config.toml` in the working directory unless it exists.
    /// Returns the path and whether it was created.
    pub fn create_default_if_missing() -> Result<(PathBuf, bool)> {
        let path = Self::default_config_path();
        if path.exists() {
            return Ok((path, false));
        }

        Self::default().save_to_path(&path)?;
        Ok((path, true))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("services.users_url", &self.services.users_url)?;
        validate_url("services.vehicles_url", &self.services.vehicles_url)?;
        validate_url("services.purchases_url", &self.services.purchases_url)?;

        if self.general.storage_path.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "general.storage_path",
            });
        }

        if self.sales.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }

        Ok(())
    }

    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(&self.general.storage_path)
    }

    #[must_use]
    pub fn sale_policy(&self) -> SalePolicy {
        SalePolicy::from(&self.sales)
    }
}

fn validate_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Empty { field });
    }

    let url = Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
        field,
        value: value.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            field,
            value: value.to_string(),
        });
    }

    Ok(())
}
