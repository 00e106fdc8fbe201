//! Chat backend client and the transport seam used by [`ChatSession`](crate::ChatSession).

use std::future::Future;
use std::time::Duration;

use civic_types::{ByteStream, ChatRequest, TransportError};
use futures::StreamExt;

use crate::config::ChatConfig;
use crate::error::{map_body_error, map_http_status, map_reqwest_error};

/// Default chat backend base URL.
const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Opens one outbound chat request and hands back the streamed reply body.
///
/// Implementations must resolve to an error for non-success responses; the
/// returned stream carries only the body of a successful response.
pub trait ChatTransport {
    /// Send `request` and return the response body as a byte stream.
    fn open(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<ByteStream, TransportError>> + Send;
}

/// HTTP client for the chat endpoint (`POST {base_url}/api/chat`).
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use civic_session::ChatBackend;
///
/// let backend = ChatBackend::new()
///     .base_url("http://localhost:3000")
///     .timeout(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct ChatBackend {
    /// Base URL (the backend itself, or the forwarding proxy).
    pub(crate) base_url: String,
    /// Optional bound on each request, body included.
    pub(crate) timeout: Option<Duration>,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl ChatBackend {
    /// Create a client for the default local backend, without timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from session configuration.
    #[must_use]
    pub fn from_config(config: &ChatConfig) -> Self {
        let backend = Self::new().base_url(config.base_url.clone());
        match config.request_timeout {
            Some(limit) => backend.timeout(limit),
            None => backend,
        }
    }

    /// Override the base URL.
    ///
    /// Useful for pointing at the forwarding proxy or a local mock server.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Bound each request, including reading the streamed body.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the chat endpoint URL.
    pub(crate) fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

impl Default for ChatBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatTransport for ChatBackend {
    fn open(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<ByteStream, TransportError>> + Send {
        let url = self.chat_url();
        let timeout = self.timeout;
        let http_client = self.client.clone();

        async move {
            tracing::debug!(
                url = %url,
                language = %request.language,
                continuing = request.conversation_id.is_some(),
                "civic.chat.request"
            );

            let mut builder = http_client
                .post(&url)
                .header("accept", "text/event-stream")
                .json(&request);
            if let Some(limit) = timeout {
                builder = builder.timeout(limit);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| map_reqwest_error(e, timeout))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(map_http_status(status, body));
            }

            let body = response
                .bytes_stream()
                .map(move |chunk| chunk.map_err(|e| map_body_error(e, timeout)));
            Ok(Box::pin(body) as ByteStream)
        }
    }
}
