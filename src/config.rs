//! Configuration types for archive-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Main configuration
///
/// Every field has a default, so `Config::default()` (or an empty JSON object)
/// produces a working configuration pointed at the public API.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service endpoint and credentials
    #[serde(default)]
    pub api: ApiConfig,

    /// Status polling behavior
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Service endpoint and HTTP client settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the `zip_downloads` endpoint is resolved against (default: "https://api.box.com/2.0/")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request (None = unauthenticated)
    #[serde(default)]
    pub access_token: Option<String>,

    /// User-Agent header value
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for the creation and status calls (default: 30 seconds)
    ///
    /// The archive download itself is not bounded by this timeout, only its
    /// connection phase is.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Status polling configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay between status polls (default: 1 second)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub interval: Duration,

    /// Overall time allowed for the job to become ready (default: 300 seconds)
    ///
    /// Can be overridden per call with [`DownloadOptions::timeout`](crate::DownloadOptions).
    #[serde(default = "default_poll_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Consecutive transient poll failures tolerated before giving up (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            timeout: default_poll_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Config {
    /// Check the configuration for values the orchestrator cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.polling.interval.is_zero() {
            return Err(config_error("poll interval must be non-zero", "polling.interval"));
        }
        if self.polling.timeout.is_zero() {
            return Err(config_error("poll timeout must be non-zero", "polling.timeout"));
        }
        if self.api.request_timeout.is_zero() {
            return Err(config_error(
                "request timeout must be non-zero",
                "api.request_timeout",
            ));
        }
        self.zip_downloads_url().map(|_| ())
    }

    /// Absolute URL of the job-creation endpoint
    pub fn zip_downloads_url(&self) -> Result<Url> {
        let mut base = Url::parse(&self.api.base_url).map_err(|e| {
            config_error(
                format!("invalid base URL '{}': {}", self.api.base_url, e),
                "api.base_url",
            )
        })?;

        // Without a trailing slash `join` would replace the last path segment
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        base.join("zip_downloads").map_err(|e| {
            config_error(
                format!("cannot resolve zip_downloads against '{}': {}", base, e),
                "api.base_url",
            )
        })
    }
}

fn config_error(message: impl Into<String>, key: &str) -> Error {
    Error::Config {
        message: message.into(),
        key: Some(key.to_string()),
    }
}

fn default_base_url() -> String {
    "https://api.box.com/2.0/".to_string()
}

fn default_user_agent() -> String {
    concat!("archive-dl/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_max_retries() -> u32 {
    3
}

// Duration serialization helper (seconds, fractions allowed)
mod duration_serde {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 || secs > u64::MAX as f64 / 1e9 {
            return Err(D::Error::custom(format!(
                "duration must be a non-negative number of seconds, got {}",
                secs
            )));
        }
        // Rounded to whole nanoseconds
        Ok(Duration::from_nanos((secs * 1e9).round() as u64))
    }
}
