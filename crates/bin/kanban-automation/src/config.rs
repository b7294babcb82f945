//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `kanban-automation.toml` in the working directory unless a path
//! is given on the command line. Every field has a sensible default so the
//! default file is optional. Environment variables take precedence over
//! file values.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use kanban_app::automation_engine::EngineConfig;

const DEFAULT_PATH: &str = "kanban-automation.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Automation engine settings.
    pub engine: EngineSettings,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Automation engine and dispatcher configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Triggers buffered before new ones are dropped.
    pub queue_capacity: usize,
    /// Soft deadline per trigger, in seconds; `0` disables it.
    pub pipeline_timeout_secs: u64,
    /// Default number of entries printed by `logs`.
    pub log_limit: usize,
}

impl Config {
    /// Load configuration from `path` (or `kanban-automation.toml` if
    /// present) then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed, if an explicitly given
    /// file cannot be read, or if validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::from_optional_file(Path::new(DEFAULT_PATH))?,
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(ConfigError::Parse)
    }

    fn from_optional_file(path: &Path) -> Result<Self, ConfigError> {
        match Self::from_file(path) {
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("KANBAN_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("KANBAN_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(capacity) = var("KANBAN_QUEUE_CAPACITY").and_then(|val| val.parse().ok()) {
            self.engine.queue_capacity = capacity;
        }
        if let Some(secs) = var("KANBAN_PIPELINE_TIMEOUT_SECS").and_then(|val| val.parse().ok()) {
            self.engine.pipeline_timeout_secs = secs;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "engine.queue_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Engine settings in the form the application layer expects.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            pipeline_timeout: (self.engine.pipeline_timeout_secs > 0)
                .then(|| Duration::from_secs(self.engine.pipeline_timeout_secs)),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:kanban.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "kanban_automation=info,kanban_app=info".to_string(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            queue_capacity: kanban_app::dispatcher::DEFAULT_QUEUE_CAPACITY,
            pipeline_timeout_secs: 30,
            log_limit: 50,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
