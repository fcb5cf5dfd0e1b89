//! Error taxonomy.
//!
//! Only configuration and startup errors propagate to the process. Identity
//! and downstream errors are recovered where they occur.

use thiserror::Error;

pub use crate::auth::relay::RelayError;
pub use crate::auth::validator::KeyError;
pub use crate::config::loader::ConfigError;

/// Why a single downstream call produced no data.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// No instance registered for the service.
    #[error("service {0} not found in registry")]
    Unresolved(String),

    /// The call exceeded the configured downstream timeout.
    #[error("timed out calling {0}")]
    Timeout(String),

    /// Connection or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Downstream answered with a non-2xx status.
    #[error("downstream returned {0}")]
    Status(reqwest::StatusCode),

    /// Body did not match the expected record shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl DownstreamError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DownstreamError::Unresolved(_) => "unresolved",
            DownstreamError::Timeout(_) => "timeout",
            DownstreamError::Transport(_) => "transport",
            DownstreamError::Status(_) => "status",
            DownstreamError::Decode(_) => "decode",
        }
    }
}

impl From<reqwest::Error> for DownstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DownstreamError::Timeout(e.url().map(|u| u.to_string()).unwrap_or_default())
        } else if let Some(status) = e.status() {
            DownstreamError::Status(status)
        } else if e.is_decode() {
            DownstreamError::Decode(e.to_string())
        } else {
            DownstreamError::Transport(e.to_string())
        }
    }
}
