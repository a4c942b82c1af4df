//! Error types for the relay.

use thiserror::Error;

/// Relay error types.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Relay error: {0}")]
    Relay(String),

    #[error("{provider} returned HTTP {status}: {message}")]
    Provider {
        provider: String,
        status: u16,
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Whether retrying the request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RelayError::Provider { status, .. } => {
                matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            RelayError::Http(err) => err.is_timeout() || err.is_connect(),
            RelayError::Relay(message) => {
                let message = message.to_lowercase();
                message.contains("rate limit")
                    || message.contains("timeout")
                    || message.contains("overloaded")
            }
            _ => false,
        }
    }

    /// Provider-requested retry delay, when one was given.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            RelayError::Provider {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }
}

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
