//! Poll error types

use std::time::Duration;
use thiserror::Error;

/// Errors from a single poll cycle
///
/// None of these are fatal: the poller reports the error downstream and tries
/// again next cycle with its cursor untouched.
#[derive(Debug, Clone, Error)]
pub enum PollError {
    #[error("Network error: {message}")]
    Transport { message: String },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

impl PollError {
    pub fn transport(message: impl Into<String>) -> Self {
        PollError::Transport {
            message: message.into(),
        }
    }

    /// Check if a later attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            PollError::Transport { .. } => true,
            PollError::Timeout(_) => true,
            PollError::Api { status, .. } => *status >= 500 || *status == 429 || *status == 403,
            PollError::Decode(_) => false,
        }
    }

    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            PollError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify a reqwest failure, keeping timeouts distinct
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            PollError::Timeout(timeout)
        } else if err.is_decode() {
            PollError::Decode(err.to_string())
        } else {
            PollError::transport(err.to_string())
        }
    }
}
