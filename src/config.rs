//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `HASHTAG_STATS_*` environment overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "HASHTAG_STATS_";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Stats database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_db_path() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("hashtag-stats").join("stats.db").to_string_lossy().to_string())
        .unwrap_or_else(|| "./data/stats.db".to_string())
}

fn default_pool_size() -> usize {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            pool_size: default_pool_size(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Version string echoed in every response
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_attribution_url")]
    pub attribution_url: String,

    #[serde(default = "default_attribution_text")]
    pub attribution_text: String,

    /// Top-N size when a request gives no limit
    #[serde(default = "default_top_limit")]
    pub default_top_limit: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_api_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_attribution_url() -> String {
    "https://www.openstreetmap.org/copyright".to_string()
}

fn default_attribution_text() -> String {
    "\u{00a9} OpenStreetMap contributors".to_string()
}

fn default_top_limit() -> u32 {
    crate::query::DEFAULT_TOP_LIMIT
}

impl ApiConfig {
    /// Address the API server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
            api_version: default_api_version(),
            attribution_url: default_attribution_url(),
            attribution_text: default_attribution_text(),
            default_top_limit: default_top_limit(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub fn filter_directive(&self) -> String {
        format!("hashtag_stats={level},tower_http={level}", level = self.level)
    }

    /// Install the global tracing subscriber, writing to stderr
    ///
    /// `RUST_LOG` takes precedence over the configured level.
    pub fn init_tracing(&self) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| self.filter_directive().into());

        let registry = tracing_subscriber::registry().with(filter);

        if self.format.eq_ignore_ascii_case("json") {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in Self::search_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Config file locations, in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("hashtag-stats").join("config.toml")),
            Some(PathBuf::from("/etc/hashtag-stats/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok());
    }

    /// Apply overrides from a lookup keyed by the suffix after the prefix
    ///
    /// Values that do not parse are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("DB_PATH") {
            self.database.path = path;
        }
        if let Some(size) = lookup("POOL_SIZE").and_then(|s| s.parse().ok()) {
            self.database.pool_size = size;
        }

        if let Some(host) = lookup("API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("API_PORT").and_then(|s| s.parse().ok()) {
            self.api.port = port;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# hashtag-stats configuration
#
# Environment variables override these settings:
# - HASHTAG_STATS_DB_PATH
# - HASHTAG_STATS_POOL_SIZE
# - HASHTAG_STATS_API_HOST
# - HASHTAG_STATS_API_PORT
# - HASHTAG_STATS_LOG_LEVEL
# - HASHTAG_STATS_LOG_FORMAT

[database]
# SQLite file holding the stats relation
path = "~/.local/share/hashtag-stats/stats.db"

# Maximum pooled connections
pool_size = 8

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8080

# Allowed CORS origins (empty allows any origin)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 30

# Version reported in response metadata
# api_version = "0.1.0"

# Attribution block included in every response
attribution_url = "https://www.openstreetmap.org/copyright"
attribution_text = "© OpenStreetMap contributors"

# Number of hashtags returned by /most-used-hashtags without a limit
default_top_limit = 10

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
