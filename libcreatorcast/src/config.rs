//! Configuration management for Creatorcast

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::types::Platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "~/.local/share/creatorcast/creatorcast.db".to_string(),
        }
    }
}

/// Where the session token lives between invocations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// OS keyring, falling back to the token file when unavailable
    #[default]
    Keyring,
    /// Plain file with 0600 permissions
    File,
    /// Process memory only
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub storage: TokenStorage,
    #[serde(default = "default_token_file")]
    pub token_file: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage: TokenStorage::default(),
            token_file: default_token_file(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

fn default_token_file() -> String {
    "~/.config/creatorcast/session.token".to_string()
}

fn default_token_ttl_hours() -> i64 {
    24 * 30
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssistantBackend {
    /// Offline, deterministic templates
    #[default]
    Template,
    /// Ollama-compatible `/api/generate` endpoint
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub backend: AssistantBackend,
    #[serde(default = "default_assistant_host")]
    pub host: String,
    #[serde(default = "default_assistant_model")]
    pub model: String,
    #[serde(default = "default_assistant_timeout")]
    pub timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            backend: AssistantBackend::default(),
            host: default_assistant_host(),
            model: default_assistant_model(),
            timeout_secs: default_assistant_timeout(),
        }
    }
}

fn default_assistant_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_assistant_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_assistant_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Length of the trailing report window
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

fn default_window_days() -> i64 {
    7
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_platform")]
    pub platform: Platform,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
        }
    }
}

fn default_platform() -> Platform {
    Platform::Youtube
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing config file is not an error; defaults are used instead.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::MissingField("database.path".to_string()).into());
        }
        if self.analytics.window_days < 1 {
            return Err(ConfigError::InvalidValue {
                field: "analytics.window_days".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.session.token_ttl_hours < 1 {
            return Err(ConfigError::InvalidValue {
                field: "session.token_ttl_hours".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CREATORCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("creatorcast").join("config.toml"))
}

/// Resolve the database path
///
/// `CREATORCAST_DB_PATH` wins over the configured path; `~` is expanded.
pub fn resolve_db_path(configured: Option<&str>) -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CREATORCAST_DB_PATH") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    match configured {
        Some(path) => Ok(PathBuf::from(shellexpand::tilde(path).to_string())),
        None => Ok(resolve_data_path()?.join("creatorcast.db")),
    }
}

/// Resolve the data directory path following XDG Base Directory spec
pub fn resolve_data_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("creatorcast"))
}
