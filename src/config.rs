//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::interval::{parse_interval, IntervalCalculator, DEFAULT_MAX_DATA_POINTS};
use crate::query::{QueryResolver, ResolverSettings, SAFE_RESOLUTION};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub datasource: DatasourceConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub calculator: CalculatorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Datasource settings relevant to query resolution
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasourceConfig {
    /// Scrape interval of the Prometheus server, e.g. "15s". Empty means unknown.
    #[serde(default)]
    pub time_interval: String,
}

/// Step resolution tunables
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_safe_resolution")]
    pub safe_resolution: i64,

    #[serde(default = "default_interval")]
    pub default_interval: String,

    #[serde(default = "default_scrape_interval")]
    pub default_scrape_interval: String,
}

fn default_safe_resolution() -> i64 {
    SAFE_RESOLUTION
}

fn default_interval() -> String {
    "15s".to_string()
}

fn default_scrape_interval() -> String {
    "15s".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            safe_resolution: default_safe_resolution(),
            default_interval: default_interval(),
            default_scrape_interval: default_scrape_interval(),
        }
    }
}

/// Stock interval calculator tunables
#[derive(Debug, Clone, Deserialize)]
pub struct CalculatorConfig {
    #[serde(default = "default_min_interval")]
    pub min_interval: String,

    #[serde(default = "default_max_points")]
    pub default_max_points: i64,
}

fn default_min_interval() -> String {
    "1ms".to_string()
}

fn default_max_points() -> i64 {
    DEFAULT_MAX_DATA_POINTS
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            min_interval: default_min_interval(),
            default_max_points: default_max_points(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

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

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
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

    /// Default config file locations, in search order
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("promstep").join("config.toml")),
            Some(PathBuf::from("/etc/promstep/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Load from default locations or environment.
    ///
    /// Returns the config together with the file it was read from, if any.
    pub fn load_default() -> Result<(Self, Option<PathBuf>), ConfigError> {
        Self::load_first(&Self::default_paths())
    }

    /// Load the first existing file among `paths`, falling back to the environment.
    ///
    /// A file that exists but cannot be loaded is an error, not a fallback.
    pub fn load_first(paths: &[PathBuf]) -> Result<(Self, Option<PathBuf>), ConfigError> {
        match paths.iter().find(|path| path.exists()) {
            Some(path) => Ok((Self::load_with_env(path)?, Some(path.clone()))),
            None => Ok((Self::from_env(), None)),
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(interval) = lookup("PROMSTEP_SCRAPE_INTERVAL") {
            self.datasource.time_interval = interval;
        }
        if let Some(resolution) = lookup("PROMSTEP_SAFE_RESOLUTION") {
            match resolution.parse() {
                Ok(r) => self.resolver.safe_resolution = r,
                Err(e) => tracing::warn!(
                    value = %resolution,
                    "Ignoring PROMSTEP_SAFE_RESOLUTION: {}",
                    e
                ),
            }
        }
        if let Some(level) = lookup("PROMSTEP_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("PROMSTEP_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Typed resolver settings
    pub fn resolver_settings(&self) -> Result<ResolverSettings, ConfigError> {
        if self.resolver.safe_resolution <= 0 {
            return Err(ConfigError::Invalid {
                key: "resolver.safe_resolution".to_string(),
                error: format!("must be positive, got {}", self.resolver.safe_resolution),
            });
        }

        Ok(ResolverSettings {
            safe_resolution: self.resolver.safe_resolution,
            default_interval: duration_setting(
                "resolver.default_interval",
                &self.resolver.default_interval,
            )?,
            default_scrape_interval: duration_setting(
                "resolver.default_scrape_interval",
                &self.resolver.default_scrape_interval,
            )?,
        })
    }

    /// Stock interval calculator configured from the `[calculator]` section
    pub fn calculator(&self) -> Result<IntervalCalculator, ConfigError> {
        let min_interval = duration_setting("calculator.min_interval", &self.calculator.min_interval)?;
        Ok(IntervalCalculator::new()
            .min_interval(min_interval)
            .default_max_points(self.calculator.default_max_points))
    }

    /// Query resolver for the configured datasource
    pub fn resolver(&self) -> Result<QueryResolver, ConfigError> {
        // Fail fast on a bad scrape interval
        if !self.datasource.time_interval.is_empty() {
            duration_setting("datasource.time_interval", &self.datasource.time_interval)?;
        }

        Ok(QueryResolver::with_policy(
            self.datasource.time_interval.clone(),
            std::sync::Arc::new(self.calculator()?),
        )
        .settings(self.resolver_settings()?))
    }
}

fn duration_setting(key: &str, value: &str) -> Result<Duration, ConfigError> {
    parse_interval(value).map_err(|e| ConfigError::Invalid {
        key: key.to_string(),
        error: e.to_string(),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid value for {key}: {error}")]
    Invalid { key: String, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Promstep Configuration
#
# Environment variables override these settings:
# - PROMSTEP_SCRAPE_INTERVAL
# - PROMSTEP_SAFE_RESOLUTION
# - PROMSTEP_LOG_LEVEL
# - PROMSTEP_LOG_FORMAT

[datasource]
# Scrape interval of the Prometheus server (empty = unknown)
time_interval = "15s"

[resolver]
# Maximum number of points a single query may return
safe_resolution = 11000

# Minimum step when neither query nor datasource declares one
default_interval = "15s"

# Scrape interval assumed by $__rate_interval when none is configured
default_scrape_interval = "15s"

[calculator]
# Smallest step the interval calculator returns
min_interval = "1ms"

# Points per panel when a query does not say
default_max_points = 1500

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
