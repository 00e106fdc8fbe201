//! Internal error helpers for mapping HTTP/reqwest errors to [`TransportError`].

use std::time::Duration;

use civic_types::TransportError;

/// Map a non-success HTTP status from the chat backend to a [`TransportError`].
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: String) -> TransportError {
    TransportError::Status {
        status: status.as_u16(),
        body,
    }
}

/// Map a [`reqwest::Error`] raised while sending the request.
pub(crate) fn map_reqwest_error(err: reqwest::Error, timeout: Option<Duration>) -> TransportError {
    match timeout {
        Some(limit) if err.is_timeout() => TransportError::Timeout(limit),
        _ => TransportError::Network(Box::new(err)),
    }
}

/// Map a [`reqwest::Error`] raised while reading the streamed body.
pub(crate) fn map_body_error(err: reqwest::Error, timeout: Option<Duration>) -> TransportError {
    match timeout {
        Some(limit) if err.is_timeout() => TransportError::Timeout(limit),
        _ => TransportError::Stream(format!("stream read error: {err}")),
    }
}
