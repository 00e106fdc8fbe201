//! Error types for all civic-chat crates.

use std::time::Duration;

/// A submission rejected before any network activity.
///
/// The transcript is never mutated by a rejected submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The message is empty or whitespace only.
    #[error("message is empty")]
    Empty,
    /// The message exceeds the configured length limit.
    #[error("message is {len} characters, limit is {max}")]
    TooLong {
        /// Length of the rejected message, in characters.
        len: usize,
        /// Configured maximum.
        max: usize,
    },
    /// A previous turn on this session is still streaming.
    #[error("a turn is already in flight")]
    TurnInFlight,
    /// The session has been torn down.
    #[error("session is closed")]
    SessionClosed,
}

/// Failure of the outbound chat request or its response stream.
///
/// Never escapes a session: it is turned into a localized transcript entry.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// Network-level failure (connection refused, reset, DNS).
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The request exceeded its configured timeout.
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    /// The response body failed mid-stream.
    #[error("stream error: {0}")]
    Stream(String),
    /// The turn was aborted by the caller.
    #[error("aborted")]
    Aborted,
}

impl TransportError {
    /// Whether resubmitting the same message might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Network(_) | Self::Timeout(_) | Self::Stream(_) => true,
            Self::Aborted => false,
        }
    }
}
