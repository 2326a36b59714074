// Config module for endpoints, transport settings and download policy

use crate::constants;
use crate::error::{Error, Result};
use crate::fetcher::RetryPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming a config file to load
pub const CONFIG_ENV: &str = "CCPKG_CONFIG";
pub const CATALOG_URL_ENV: &str = "CCPKG_CATALOG_URL";
pub const MANIFEST_URL_ENV: &str = "CCPKG_MANIFEST_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub endpoints: Endpoints,
    pub transport: TransportConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Endpoints {
    pub catalog_url: String,
    pub manifest_url: String,
    pub channels: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            catalog_url: constants::CATALOG_URL.to_string(),
            manifest_url: constants::MANIFEST_URL.to_string(),
            channels: constants::CATALOG_CHANNELS.to_string(),
        }
    }
}

/// Fixed headers and connection settings for the vendor endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    pub app_id: String,
    pub user_agent: String,
    pub api_key: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// The vendor CDN is reached without certificate validation by default
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            app_id: constants::APP_ID.to_string(),
            user_agent: constants::USER_AGENT.to_string(),
            api_key: constants::API_KEY.to_string(),
            connect_timeout_secs: constants::DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: constants::DEFAULT_READ_TIMEOUT_SECS,
            accept_invalid_certs: true,
        }
    }
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub chunk_size: usize,
    /// Number of SAP-code groups downloaded at the same time
    pub concurrency: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_attempts: constants::DEFAULT_MAX_ATTEMPTS,
            backoff_ms: constants::DEFAULT_BACKOFF_MS,
            chunk_size: constants::DEFAULT_CHUNK_SIZE,
            concurrency: 1,
        }
    }
}

impl DownloadConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, `CCPKG_CONFIG`, or `./ccpkg.toml`,
    /// then apply environment overrides. Falls back to defaults when no file exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match config_path(explicit) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        log::debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| Error::config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(CATALOG_URL_ENV) {
            self.endpoints.catalog_url = url;
        }
        if let Ok(url) = std::env::var(MANIFEST_URL_ENV) {
            self.endpoints.manifest_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.download.max_attempts == 0 {
            return Err(Error::config("download.max_attempts must be at least 1"));
        }
        if self.download.chunk_size == 0 {
            return Err(Error::config("download.chunk_size must be at least 1"));
        }
        if self.download.concurrency == 0 {
            return Err(Error::config("download.concurrency must be at least 1"));
        }
        Ok(())
    }
}

pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(constants::CONFIG_FILE);
    local.exists().then_some(local)
}
