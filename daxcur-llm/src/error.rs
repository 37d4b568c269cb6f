//! Chat error types.

use thiserror::Error;

use crate::types::Tier;

/// Errors from a single upstream chat or correction call.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Request exceeded the configured timeout.
    #[error("chat request timed out after {0}ms")]
    Timeout(u64),

    /// Upstream could not be reached.
    #[error("chat upstream unavailable: {0}")]
    Unavailable(String),

    /// Upstream answered with a non-success status.
    #[error("chat upstream returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// Response body was not the JSON we expected.
    #[error("failed to decode chat response: {0}")]
    Decode(String),

    /// Upstream returned an empty reply.
    #[error("chat upstream returned empty content")]
    EmptyReply,

    /// The tier has no URL configured for this request.
    #[error("{0} tier not configured")]
    NotConfigured(Tier),

    /// Caller cancelled the request.
    #[error("chat request cancelled")]
    Cancelled,
}

impl ChatError {
    /// Whether the failure was a missing configuration rather than a
    /// failed network call.
    #[must_use]
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Timeout(0)
        } else if err.is_connect() {
            ChatError::Unavailable(err.to_string())
        } else if err.is_decode() {
            ChatError::Decode(err.to_string())
        } else {
            ChatError::Unavailable(err.to_string())
        }
    }
}
