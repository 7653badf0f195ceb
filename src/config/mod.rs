//! Client configuration
//!
//! Read from `config.yml` next to the binary, then overridden by
//! `NIHONGO_*` environment variables. Every section has defaults, so an
//! absent or empty file yields a client pointed at `http://localhost:5000`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Client-side storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Settings negotiation configuration
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST backend
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ApiConfig {
    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Client-side storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage driver (memory or file)
    #[serde(default)]
    pub driver: StorageDriver,
    /// Path of the state file (file driver only)
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            driver: StorageDriver::default(),
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/client-state.json")
}

/// Storage driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    /// In-process only, lost on exit
    Memory,
    /// JSON file on disk (default)
    #[default]
    File,
}

/// Settings negotiation configuration
///
/// Both lists are tried in order. Trimming them narrows the probe without
/// changing the search contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Candidate resource paths
    #[serde(default = "default_candidate_urls")]
    pub candidate_urls: Vec<String>,
    /// Candidate write methods
    #[serde(default = "default_write_methods")]
    pub methods: Vec<String>,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            candidate_urls: default_candidate_urls(),
            methods: default_write_methods(),
        }
    }
}

fn default_candidate_urls() -> Vec<String> {
    vec![
        "/api/settings".to_string(),
        "/api/class/settings".to_string(),
        "/settings".to_string(),
        "/api/v1/settings".to_string(),
    ]
}

fn default_write_methods() -> Vec<String> {
    vec!["PUT".to_string(), "PATCH".to_string(), "POST".to_string()]
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Read `path`; a missing or blank file gives the defaults
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - NIHONGO_API_URL
    /// - NIHONGO_API_TIMEOUT_SECONDS
    /// - NIHONGO_STORAGE_DRIVER
    /// - NIHONGO_STORAGE_PATH
    pub fn load_with_env(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NIHONGO_API_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(timeout) = std::env::var("NIHONGO_API_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.api.timeout_seconds = timeout;
            }
        }

        if let Ok(driver) = std::env::var("NIHONGO_STORAGE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "memory" => self.storage.driver = StorageDriver::Memory,
                "file" => self.storage.driver = StorageDriver::File,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(path) = std::env::var("NIHONGO_STORAGE_PATH") {
            self.storage.path = PathBuf::from(path);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.settings.candidate_urls.is_empty() {
            return Err(ConfigError::ValidationError(
                "settings.candidate_urls must not be empty".to_string(),
            ));
        }
        if self.settings.methods.is_empty() {
            return Err(ConfigError::ValidationError(
                "settings.methods must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by `tests` and `property_tests`; both mutate process environment.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
