//! Configuration management for the Fire_cci fetcher
//!
//! Settings come from, in increasing precedence: built-in defaults, a TOML
//! file, `FIRE_CCI_*` environment variables, and command line flags (the
//! latter applied by the CLI). Every section and key is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{CacheConfig, ClientConfig, Resolver};
use crate::constants::{env, http, logging, product, workers};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Cache settings
    pub cache: CacheConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Batch fetch settings
    pub fetch: FetchConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfigToml {
    /// Cache directory path (system cache directory if unset)
    pub cache_root: Option<PathBuf>,
    /// Write MD5 sidecars next to downloaded files
    pub write_checksums: bool,
}

impl Default for CacheConfigToml {
    fn default() -> Self {
        Self {
            cache_root: None,
            write_checksums: true,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Archive directory holding the per-year folders
    pub base_url: String,
    /// Longest wait for the response or the next body chunk, in seconds
    pub read_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// User agent header
    pub user_agent: String,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            base_url: product::BASE_URL.to_string(),
            read_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            user_agent: http::USER_AGENT.to_string(),
            tcp_nodelay: true,
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
        }
    }
}

/// TOML-friendly batch fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfigToml {
    /// Months downloaded concurrently
    pub concurrency: usize,
}

impl Default for FetchConfigToml {
    fn default() -> Self {
        Self {
            concurrency: workers::DEFAULT_CONCURRENCY,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for out-of-range values or a
    /// malformed base URL
    pub fn to_runtime_config(&self) -> ConfigResult<(CacheConfig, ClientConfig, Resolver)> {
        self.validate()?;
        let resolver = Resolver::new(&self.client.base_url)?;
        Ok((
            self.cache.to_runtime_config(),
            self.client.to_runtime_config(self.fetch.concurrency),
            resolver,
        ))
    }

    fn validate(&self) -> ConfigResult<()> {
        if !(1..=workers::MAX_CONCURRENCY).contains(&self.fetch.concurrency) {
            return Err(ConfigError::InvalidValue {
                field: "fetch.concurrency".to_string(),
                value: self.fetch.concurrency.to_string(),
                reason: format!("Must be between 1 and {}", workers::MAX_CONCURRENCY),
            });
        }
        if self.client.read_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.read_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "Must be positive".to_string(),
            });
        }
        if self.client.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.connect_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "Must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (explicit, else the first one found)
    /// 3. Environment variables
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound { path }),
            Some(path) => Some(path),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => Self::load_from_file(&path).await?,
            None => Self::default(),
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply `FIRE_CCI_*` overrides using `lookup` to read variables
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(env::CACHE_DIR).filter(|v| !v.is_empty()) {
            debug!("Cache directory overridden by {}", env::CACHE_DIR);
            self.cache.cache_root = Some(PathBuf::from(dir));
        }
        if let Some(url) = lookup(env::BASE_URL).filter(|v| !v.is_empty()) {
            debug!("Base URL overridden by {}", env::BASE_URL);
            self.client.base_url = url;
        }
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from("./fire-cci.toml")];
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        let found = search_paths.into_iter().find(|path| path.is_file());
        match &found {
            Some(path) => debug!("Found config file: {}", path.display()),
            None => debug!("No config file found in standard locations"),
        }
        found
    }

    /// Default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fire-cci-fetcher").join("config.toml"))
    }

    /// Load configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> String {
        // Every field is a plain string, number, bool or path
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

impl CacheConfigToml {
    /// Convert to runtime CacheConfig
    pub fn to_runtime_config(&self) -> CacheConfig {
        CacheConfig {
            cache_root: self.cache_root.clone(),
            write_checksums: self.write_checksums,
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self, concurrency: usize) -> ClientConfig {
        ClientConfig {
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            user_agent: self.user_agent.clone(),
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            concurrency,
        }
    }
}
