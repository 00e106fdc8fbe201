//! Proxy error types and their HTTP rendering.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Invalid proxy configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `PORT` is not a valid port number.
    #[error("invalid PORT: {0:?}")]
    Port(String),
}

/// Upstream failures, rendered as `{"error":"Backend error","status":<code>}`.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The backend answered with a non-success status.
    #[error("backend returned status {0}")]
    Upstream(StatusCode),
    /// The backend could not be reached.
    #[error("backend unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
}

impl ProxyError {
    /// Status code sent to the client.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Upstream(status) => *status,
            Self::Unreachable(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": "Backend error",
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

/// Convert a status from the upstream client into the server's status type.
pub(crate) fn relay_status(status: reqwest::StatusCode) -> StatusCode {
    StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY)
}
