//! # Error Taxonomy
//!
//! Every failure the client can surface. Per-record failures of an append
//! batch never reach the caller as errors; they are folded into
//! `AppendResponse` values by the retry driver. Only `Unauthorized` escapes
//! a batch, and `MalformedLine` ends a listgen record stream.

use std::time::Duration;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ReachError>;

/// Errors raised while building or validating `ReachOptions`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("an API key is required")]
    MissingApiKey,

    #[error("the API key contains characters not allowed in an HTTP header")]
    InvalidApiKey,

    #[error("requests per second must be at least 1")]
    ZeroRequestsPerSecond,

    #[error("max retries must be at least 1")]
    ZeroMaxRetries,

    #[error("environment variable {name} has an invalid value: {value:?}")]
    InvalidEnvVar { name: String, value: String },
}

#[derive(Debug, Error)]
pub enum ReachError {
    /// HTTP 401. Global to the API key, so it aborts the whole batch.
    #[error("ReachClient received 401 unauthorized from the server. Check your API key.")]
    Unauthorized,

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed with HTTP status {status}")]
    Http { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed NDJSON line {line:?}: {source}")]
    MalformedLine {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ReachError {
    /// True for failures that must abort an entire append batch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReachError::Unauthorized)
    }
}

impl From<reqwest::Error> for ReachError {
    fn from(e: reqwest::Error) -> Self {
        ReachError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unauthorized_is_fatal() {
        assert!(ReachError::Unauthorized.is_fatal());
        assert!(!ReachError::Timeout(Duration::from_secs(1)).is_fatal());
        assert!(!ReachError::Http { status: 500 }.is_fatal());
        assert!(!ReachError::Transport("reset".into()).is_fatal());
    }

    #[test]
    fn unauthorized_message_mentions_api_key() {
        let msg = ReachError::Unauthorized.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("API key"));
    }
}
