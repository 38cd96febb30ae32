// Configuration module: reads the backend location and the upload timeout
// from the environment. A `.env` file in the working directory is loaded
// first when present.

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Runtime settings for the API client.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Timeout applied to image uploads only. Registration calls have none.
    pub upload_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.into(),
            upload_timeout: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Build a config from `API_BASE_URL` and `UPLOAD_TIMEOUT_SECS`,
    /// falling back to the defaults for missing variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            log::debug!("no .env file loaded: {}", e);
        }
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as `from_env` but with an injectable variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = lookup("API_BASE_URL") {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                config.base_url = url.to_string();
            }
        }

        if let Some(raw) = lookup("UPLOAD_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                name: "UPLOAD_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            config.upload_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
