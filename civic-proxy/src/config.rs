//! Proxy settings read from the environment.

use std::net::{Ipv4Addr, SocketAddr};

use crate::error::ConfigError;

/// Default upstream chat backend.
const DEFAULT_UPSTREAM: &str = "http://localhost:8000";

/// Default listening port.
const DEFAULT_PORT: u16 = 3000;

/// Primary upstream variable.
pub const ENV_BACKEND_URL: &str = "BACKEND_URL";

/// Fallback upstream variable, shared with the web front end.
pub const ENV_PUBLIC_API_URL: &str = "NEXT_PUBLIC_API_URL";

/// Listening port variable.
pub const ENV_PORT: &str = "PORT";

/// Where the proxy listens and where it forwards to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Base URL of the chat backend, without trailing slash.
    pub upstream_url: String,
    /// Listening address.
    pub bind: SocketAddr,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM.into(),
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
        }
    }
}

impl ProxyConfig {
    /// Read `BACKEND_URL` (then `NEXT_PUBLIC_API_URL`) and `PORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let upstream = [ENV_BACKEND_URL, ENV_PUBLIC_API_URL]
            .into_iter()
            .filter_map(|key| lookup(key))
            .find(|url| !url.trim().is_empty());
        if let Some(url) = upstream {
            config.upstream_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup(ENV_PORT) {
            let port: u16 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Port(raw.clone()))?;
            config.bind.set_port(port);
        }

        Ok(config)
    }

    /// Override the upstream URL.
    #[must_use]
    pub fn upstream_url(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the listening address.
    #[must_use]
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind = addr;
        self
    }
}
