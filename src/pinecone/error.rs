//! Control-plane errors
//!
//! Every failure a lifecycle operation can hit, classified so callers can
//! tell a precondition failure from a remote rejection without string matching.

use super::types::ParseError;
use std::time::Duration;

/// Result alias for control-plane operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No environment configured; no request was sent
    #[error("environment is empty")]
    MissingEnvironment,

    /// No API key configured; no request was sent
    #[error("api key is empty")]
    MissingApiKey,

    #[error("invalid controller endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Connection-level failure, surfaced verbatim
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Remote rejection (HTTP status >= 400)
    #[error("{operation} failed with status code {status}")]
    Status { operation: &'static str, status: u16 },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("index not found: {0}")]
    NotFound(String),

    #[error("wait for index {0} was cancelled")]
    Cancelled(String),

    #[error("index {name} did not converge within {}s", elapsed.as_secs())]
    Timeout { name: String, elapsed: Duration },
}

impl Error {
    /// True for failures detected before any network call
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingEnvironment | Self::MissingApiKey | Self::InvalidEndpoint { .. } | Self::Parse(_)
        )
    }

    /// HTTP status code for remote rejections
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Format a control-plane error for display in a diagnostic
/// Maps well-known status codes to a short hint; other errors keep their message
pub fn format_api_error(error: &Error) -> String {
    let hint = match error.status() {
        Some(401) => Some("Authentication failed. Check the configured API key."),
        Some(403) => Some("Permission denied. The API key cannot manage indexes in this environment."),
        Some(404) => Some("Index not found."),
        Some(409) => Some("Index conflict. An index with this name may already exist."),
        Some(429) => Some("Rate limit exceeded. Please try again later."),
        Some(400) => Some("Invalid request. Check the index parameters."),
        Some(500) | Some(503) => Some("Pinecone control plane temporarily unavailable. Please try again."),
        _ => None,
    };

    match hint {
        Some(hint) => format!("{} ({})", error, hint),
        None => error.to_string(),
    }
}
