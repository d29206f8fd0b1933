//! # Console Configuration
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`SALE_ADMIN_*`)
//! 2. Config file (`console.toml`, or the `--config` path)
//! 3. Defaults (this file)
//!
//! ```toml
//! base_url = "https://store.example.com/"
//! api_token = "..."
//! timeout_secs = 30
//! log_filter = "info,sale_screen=debug"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use sale_store::HttpStoreConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Console configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Root URL of the remote store.
    pub base_url: String,

    /// Bearer token sent with every request.
    pub api_token: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Tracing filter directive, used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            base_url: "http://localhost:8080/".to_string(),
            api_token: None,
            timeout_secs: 30,
            log_filter: "info".to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file; an explicit path must exist, the default one may not
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(?path, "Loading console config");
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `SALE_ADMIN_*` overrides read through `lookup`.
    ///
    /// ## Environment Variables
    /// - `SALE_ADMIN_BASE_URL`
    /// - `SALE_ADMIN_API_TOKEN`
    /// - `SALE_ADMIN_TIMEOUT_SECS`
    /// - `SALE_ADMIN_LOG`
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("SALE_ADMIN_BASE_URL") {
            self.base_url = url;
        }
        if let Some(token) = lookup("SALE_ADMIN_API_TOKEN") {
            self.api_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(secs) = lookup("SALE_ADMIN_TIMEOUT_SECS") {
            self.timeout_secs = secs.parse().map_err(|_| ConfigError::InvalidValue {
                key: "SALE_ADMIN_TIMEOUT_SECS".to_string(),
                value: secs.clone(),
            })?;
        }
        if let Some(filter) = lookup("SALE_ADMIN_LOG") {
            self.log_filter = filter;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.parsed_base_url()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "base_url must be http or https, got: {}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", self.base_url, e)))
    }

    /// Transport settings for the HTTP store.
    pub fn store_config(&self) -> Result<HttpStoreConfig, ConfigError> {
        let mut config = HttpStoreConfig::new(self.parsed_base_url()?)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        config.api_token = self.api_token.clone();
        Ok(config)
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "sale-admin", "console")
            .map(|dirs| dirs.config_dir().join("console.toml"))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
