//! # Configuration
//!
//! Client configuration resolved from defaults, an optional YAML or JSON
//! file, and `CAMPUS_*` environment variables, in that order.

use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use thiserror::Error;
use url::Url;

use crate::models::DEFAULT_PER_PAGE;

/// Environment variable overriding [`ClientConfig::api_base_url`].
pub const ENV_API_BASE_URL: &str = "CAMPUS_API_BASE_URL";
/// Environment variable overriding [`ClientConfig::per_page`].
pub const ENV_PER_PAGE: &str = "CAMPUS_PER_PAGE";
/// Environment variable overriding [`ClientConfig::request_timeout_secs`].
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "CAMPUS_REQUEST_TIMEOUT_SECS";
/// Environment variable overriding [`ClientConfig::log_level`].
pub const ENV_LOG_LEVEL: &str = "CAMPUS_LOG_LEVEL";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file extension is not supported.
    #[error("unsupported configuration format for {path}; use 'yaml' or 'json'")]
    UnsupportedFormat { path: PathBuf },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// An environment variable held an unusable value.
    #[error("invalid {name} value {value:?}: {reason}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// The resolved configuration failed validation.
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Configuration of the campus client core.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the campus REST API, e.g. `https://campus.example/api`.
    pub api_base_url: String,

    /// Default page size for paginated list controllers.
    pub per_page: u32,

    /// Per-request timeout enforced by the HTTP transport, in seconds.
    pub request_timeout_secs: u64,

    /// Logging level or `EnvFilter` directive.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    /// Generates a default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            per_page: DEFAULT_PER_PAGE,
            request_timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a `.yaml`/`.yml` or `.json` file.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or parsed, an
    /// environment override is malformed, or the result fails validation.
    pub fn load_config(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::with_defaults(),
        };

        config.apply_env_overrides()?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => {
                serde_yml::from_str(&content).map_err(|err| ConfigError::Parse {
                    path: path.clone(),
                    message: err.to_string(),
                })
            }
            Some("json") => serde_json::from_str(&content).map_err(|err| ConfigError::Parse {
                path: path.clone(),
                message: err.to_string(),
            }),
            _ => Err(ConfigError::UnsupportedFormat { path }),
        }
    }

    /// Apply `CAMPUS_*` environment overrides on top of the current values.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidEnv`] when a numeric override does not parse.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(base_url) = env::var(ENV_API_BASE_URL) {
            self.api_base_url = base_url;
        }
        if let Ok(per_page) = env::var(ENV_PER_PAGE) {
            self.per_page = parse_env(ENV_PER_PAGE, &per_page)?;
        }
        if let Ok(timeout) = env::var(ENV_REQUEST_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_env(ENV_REQUEST_TIMEOUT_SECS, &timeout)?;
        }
        if let Ok(level) = env::var(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        Ok(())
    }

    /// Validate the configuration, collecting every problem found.
    ///
    /// # Errors
    /// Returns the list of validation messages when anything is wrong.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        match Url::parse(&self.api_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "api_base_url must use http or https, got '{}'",
                url.scheme()
            )),
            Err(err) => errors.push(format!(
                "api_base_url '{}' is not an absolute URL: {err}",
                self.api_base_url
            )),
        }

        if self.per_page == 0 {
            errors.push("per_page must be greater than 0".to_string());
        }

        if self.request_timeout_secs == 0 {
            errors.push("request_timeout_secs must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Base URL parsed and normalised to end with `/`, ready for joining.
    ///
    /// # Errors
    /// Returns the parse error for a malformed base URL.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        let mut raw = self.api_base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw)
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|err: T::Err| ConfigError::InvalidEnv {
        name,
        value: value.to_string(),
        reason: err.to_string(),
    })
}
