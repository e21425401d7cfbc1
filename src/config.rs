//! isa-docs Configuration
//!
//! Handles parsing and management of isa-docs.toml configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::resolver::SearchLimits;

/// Configuration file name searched for from the working directory upwards.
pub const CONFIG_FILE_NAME: &str = "isa-docs.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching isa-docs.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IsaDocsConfig {
    /// Snapshot location
    #[serde(default)]
    pub store: StoreConfig,

    /// Search bounds
    #[serde(default)]
    pub search: SearchConfig,

    /// HTTP transport
    #[serde(default)]
    pub server: ServerConfig,
}

impl IsaDocsConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: IsaDocsConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the current directory or parents.
    pub fn load_from_cwd() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::Io)?;
        Self::find_and_load(&cwd)
    }

    /// Find and load configuration by searching up from the given directory.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                tracing::debug!(path = %config_path.display(), "Using config file");
                return Self::load(&config_path);
            }
            if !dir.pop() {
                // Reached root without finding config
                return Ok(Self::default());
            }
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.search.max_results == 0 {
            return Err(ConfigError::Invalid(
                "search.max_results must be at least 1".to_string(),
            ));
        }
        if self.search.max_page_size == 0 {
            return Err(ConfigError::Invalid(
                "search.max_page_size must be at least 1".to_string(),
            ));
        }
        if self.server.workers == 0 {
            return Err(ConfigError::Invalid(
                "server.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Search bounds for the resolver.
    pub fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            max_results: self.search.max_results,
            max_page_size: self.search.max_page_size,
            timeout: Duration::from_millis(self.search.timeout_ms),
        }
    }
}

/// Snapshot location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the JSON snapshot
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("isa_docs.json")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Search bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum hits returned by `search_instructions`
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Upper bound for paginated page sizes
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Per-query budget in milliseconds (0 disables)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_results() -> usize {
    50
}

fn default_max_page_size() -> usize {
    500
}

fn default_timeout_ms() -> u64 {
    2000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            max_page_size: default_max_page_size(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Connection worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_workers() -> usize {
    4
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            workers: default_workers(),
        }
    }
}
