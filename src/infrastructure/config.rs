//! Configuration infrastructure
//!
//! Layered loading with the `config` crate:
//! 1. Built-in defaults (serde `default`)
//! 2. Optional config file (TOML/JSON/YAML, by extension)
//! 3. Environment overrides, e.g. `CATALOG_CONSOLE__API__BASE_URL`

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::constants::{progress, query};
use crate::domain::signature::SignatureBuilder;

pub const ENV_PREFIX: &str = "CATALOG_CONSOLE";
pub const CONFIG_FILE_NAME: &str = "catalog_console.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {field} - {message}")]
    Validation { field: &'static str, message: String },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Complete console configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api: ApiConfig,
    pub query: QueryConfig,
    pub progress: ProgressConfig,
    pub logging: LoggingConfig,
}

/// Catalog backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend root, e.g. `http://localhost:8000`
    pub base_url: String,
    pub user_agent: String,
    /// Transport-level timeout; the orchestrator itself imposes none
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            user_agent: format!("catalog-console/{}", env!("CARGO_PKG_VERSION")),
            timeout_seconds: 120,
            max_requests_per_second: 20,
        }
    }
}

/// Query shaping settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub page_size: u32,
    pub min_search_length: usize,
    pub debounce_ms: u64,
    pub page_window: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            page_size: query::DEFAULT_PAGE_SIZE,
            min_search_length: query::MIN_SEARCH_LENGTH,
            debounce_ms: query::SEARCH_DEBOUNCE_MS,
            page_window: query::PAGE_WINDOW,
        }
    }
}

impl QueryConfig {
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn signature_builder(&self) -> SignatureBuilder {
        SignatureBuilder::new(self.page_size, self.min_search_length)
    }
}

/// Import progress refresh cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub base_refresh_interval_ms: u64,
    pub active_refresh_interval_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            base_refresh_interval_ms: progress::BASE_REFRESH_INTERVAL_MS,
            active_refresh_interval_ms: progress::ACTIVE_REFRESH_INTERVAL_MS,
        }
    }
}

impl ProgressConfig {
    pub const fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_refresh_interval_ms)
    }

    pub const fn active_interval(&self) -> Duration {
        Duration::from_millis(self.active_refresh_interval_ms)
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    pub console_output: bool,

    pub file_output: bool,

    /// Directory for the log file; defaults to `<data dir>/catalog-console/logs`
    pub log_dir: Option<PathBuf>,

    pub file_name: String,

    /// Module-specific level overrides (e.g. "reqwest": "debug")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            file_name: "catalog-console.log".to_string(),
            module_filters: HashMap::new(),
        }
    }
}

impl ConsoleConfig {
    /// Default config file location under the user config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("catalog-console").join(CONFIG_FILE_NAME))
    }

    /// Loads defaults, then `path` (required) or the default file (optional),
    /// then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(default_path) = Self::default_path() {
                    builder = builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        info!("✅ Configuration loaded (backend: {})", config.api.base_url);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api.base_url)
            .map_err(|e| ConfigError::invalid("api.base_url", e.to_string()))?;

        if self.api.max_requests_per_second == 0 {
            return Err(ConfigError::invalid("api.max_requests_per_second", "must be greater than 0"));
        }
        if self.query.page_size == 0 || self.query.page_size > query::MAX_PAGE_SIZE {
            return Err(ConfigError::invalid(
                "query.page_size",
                format!("must be between 1 and {}", query::MAX_PAGE_SIZE),
            ));
        }
        if self.progress.active_refresh_interval_ms == 0 || self.progress.base_refresh_interval_ms == 0 {
            return Err(ConfigError::invalid("progress", "refresh intervals must be greater than 0"));
        }
        if self.progress.active_refresh_interval_ms > self.progress.base_refresh_interval_ms {
            return Err(ConfigError::invalid(
                "progress.active_refresh_interval_ms",
                "cannot be longer than base_refresh_interval_ms",
            ));
        }
        if !self.logging.console_output && !self.logging.file_output {
            return Err(ConfigError::invalid("logging", "no logging output configured"));
        }
        Ok(())
    }
}
