//! Forwarding proxy for civic-chat.
//!
//! Sits between the web front end and the chat backend. Chat requests are
//! forwarded and their event stream relayed byte for byte; analytics reads are
//! forwarded with the admin password header.
//!
//! ```no_run
//! use civic_proxy::{AppState, ProxyConfig, router};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProxyConfig::from_env()?;
//! let listener = tokio::net::TcpListener::bind(config.bind).await?;
//! axum::serve(listener, router(AppState::new(&config))).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

pub use config::ProxyConfig;
pub use error::{ConfigError, ProxyError};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub(crate) client: reqwest::Client,
    pub(crate) upstream_url: Arc<str>,
}

impl AppState {
    /// State forwarding to `config.upstream_url`.
    #[must_use]
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            upstream_url: Arc::from(config.upstream_url.trim_end_matches('/')),
        }
    }
}

/// Build the proxy router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(routes::chat))
        .route("/api/analytics/{*path}", get(routes::analytics))
        .route("/health", get(routes::health))
        .with_state(state)
}
