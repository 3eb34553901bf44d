//! Runtime settings loaded via `OrthoConfig`.
//!
//! Values come from `REVIEW_ROSTER_*` environment variables or a
//! configuration file; the binary parses its own command line separately.

use crate::review::ports::MAX_TRANSACTION_TIMEOUT;
use crate::telemetry::LogFormat;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use std::ffi::OsString;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Errors raised while loading or interpreting settings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The settings sources could not be merged.
    #[error("failed to load settings: {0}")]
    Load(String),

    /// No database URL was configured.
    #[error("REVIEW_ROSTER_DATABASE_URL is not set")]
    MissingDatabaseUrl,

    /// The log format is neither `json` nor `pretty`.
    #[error("unknown log format '{0}', expected 'json' or 'pretty'")]
    InvalidLogFormat(String),
}

/// Settings for the review roster binary.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "REVIEW_ROSTER")]
pub struct ReviewRosterSettings {
    /// `PostgreSQL` connection URL.
    pub database_url: Option<String>,
    /// Upper bound on pooled connections.
    #[ortho_config(default = 10)]
    pub max_connections: u32,
    /// Transaction time budget in seconds.
    #[ortho_config(default = 30)]
    pub transaction_timeout_secs: u64,
    /// Log output format, `json` or `pretty`.
    pub log_format: Option<String>,
}

impl ReviewRosterSettings {
    /// Loads settings from the environment and configuration files only.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a source holds malformed values.
    pub fn from_environment() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("review-roster")])
            .map_err(|err| ConfigError::Load(err.to_string()))
    }

    /// Returns the configured database URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabaseUrl`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)
    }

    /// Returns the pool size, falling back to ten connections.
    #[must_use]
    pub const fn max_connections(&self) -> u32 {
        if self.max_connections == 0 {
            DEFAULT_MAX_CONNECTIONS
        } else {
            self.max_connections
        }
    }

    /// Returns the transaction timeout, clamped to the supported maximum.
    #[must_use]
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_secs(self.transaction_timeout_secs).min(MAX_TRANSACTION_TIMEOUT)
    }

    /// Returns the log format, defaulting to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLogFormat`] for unrecognised values.
    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        self.log_format.as_deref().map_or(Ok(LogFormat::Json), |raw| {
            raw.parse()
                .map_err(|()| ConfigError::InvalidLogFormat(raw.to_owned()))
        })
    }
}
