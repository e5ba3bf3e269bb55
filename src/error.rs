//! Error types for guild-export
//!
//! Errors fall into three classes:
//! - Setup errors (configuration, metadata, output file creation) abort the run
//!   before any worker starts
//! - Fetch errors (network, API status) are absorbed by the channel paginator
//! - Sink errors are fatal and terminate the whole export

use crate::types::ExportRecord;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for guild-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for guild-export
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "token")
        key: Option<String>,
    },

    /// I/O error outside of the sink (config file, output file creation)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid API base URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The remote API answered with a non-success status
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message returned by the API (or the raw body)
        message: String,
        /// Server supplied delay before the request may be repeated (HTTP 429)
        retry_after: Option<Duration>,
    },

    /// Writing a record to the output stream failed; the export cannot continue
    #[error("error writing record to output: {source} (record: {record:?})")]
    Sink {
        /// The record that could not be written
        record: ExportRecord,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A worker task panicked or was cancelled
    #[error("worker failure: {0}")]
    Worker(String),
}

impl Error {
    /// Build a configuration error for the given key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
