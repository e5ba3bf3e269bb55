//! Configuration types for guild-export
//!
//! The configuration is a JSON document with camelCase keys:
//!
//! ```json
//! {
//!   "token": "bot-token",
//!   "guildID": "123456789012345678",
//!   "excludeChannelIDs": ["234567890123456789"],
//!   "outputPath": "messages.csv",
//!   "concurrentChannels": 4,
//!   "omitEmpty": true
//! }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path, path::PathBuf, time::Duration};

/// Run parameters, read-only for the lifetime of an export
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Bot token passed to the API client
    pub token: String,

    /// Guild to export
    #[serde(rename = "guildID")]
    pub guild_id: String,

    /// Channels that are never exported
    #[serde(rename = "excludeChannelIDs", default)]
    pub exclude_channel_ids: Vec<String>,

    /// Output file, created or truncated at the start of the export (default: "messages.csv")
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Number of channels exported in parallel; also the number of progress lines (default: 1)
    #[serde(default = "default_concurrent_channels")]
    pub concurrent_channels: usize,

    /// Skip messages whose text content is empty (skews message totals)
    #[serde(default)]
    pub omit_empty: bool,

    /// HTTP client settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Read and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_slice(&bytes)
    }

    /// Parse and validate a configuration document
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let config: Config = serde_json::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the exporter relies on
    pub fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(Error::config(
                "Config token is empty! Please provide a token!",
                "token",
            ));
        }
        if self.guild_id.is_empty() {
            return Err(Error::config("guild id must not be empty", "guildID"));
        }
        if self.concurrent_channels == 0 {
            return Err(Error::config(
                "concurrentChannels must be a positive integer",
                "concurrentChannels",
            ));
        }
        self.api.retry.validate()
    }

    /// Excluded channel ids as a set for membership tests
    pub fn excluded_channels(&self) -> HashSet<String> {
        self.exclude_channel_ids.iter().cloned().collect()
    }
}

/// Remote API client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Base URL of the REST API (default: "https://discord.com/api/v10")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(
        default = "default_request_timeout",
        rename = "timeoutSecs",
        with = "duration_serde"
    )]
    pub request_timeout: Duration,

    /// Retry policy for rate limits and transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl RetryConfig {
    /// Reject policies the backoff computation cannot honour
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::config(
                format!(
                    "backoffMultiplier must be a finite number of at least 1.0, got {}",
                    self.backoff_multiplier
                ),
                "api.retry.backoffMultiplier",
            ));
        }
        if self.max_delay < self.initial_delay {
            return Err(Error::config(
                "maxDelay must not be shorter than initialDelay",
                "api.retry.maxDelay",
            ));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("messages.csv")
}

fn default_concurrent_channels() -> usize {
    1
}

fn default_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
