//! Configuration for a chat session and its backend.

use std::time::Duration;

use civic_types::{Language, UnknownLanguage};

/// Default backend base URL.
const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Longest message the backend accepts, in characters.
const DEFAULT_MAX_MESSAGE_CHARS: usize = 2000;

/// Environment variable holding the backend base URL.
pub const ENV_API_URL: &str = "CIVIC_CHAT_API_URL";

/// Fallback variable for the base URL, shared with the web front end.
pub const ENV_PUBLIC_API_URL: &str = "NEXT_PUBLIC_API_URL";

/// Environment variable selecting the session language (`en` or `es`).
pub const ENV_LANGUAGE: &str = "CIVIC_CHAT_LANGUAGE";

/// Environment variable holding the request timeout in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "CIVIC_CHAT_TIMEOUT_SECS";

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The language variable holds an unsupported code.
    #[error("invalid CIVIC_CHAT_LANGUAGE: {0}")]
    Language(#[from] UnknownLanguage),
    /// The timeout variable is not a positive integer.
    #[error("invalid CIVIC_CHAT_TIMEOUT_SECS: {0:?}")]
    Timeout(String),
}

/// Settings for one chat session.
///
/// The language is session-scoped: it is sent with every request and picks
/// the text of failure messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Base URL of the chat backend (or of the forwarding proxy).
    pub base_url: String,
    /// Session language.
    pub language: Language,
    /// Submissions longer than this many characters are rejected.
    pub max_message_chars: usize,
    /// Optional bound on each request, including reading the streamed body.
    pub request_timeout: Option<Duration>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            language: Language::En,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
            request_timeout: None,
        }
    }
}

impl ChatConfig {
    /// Read configuration from the process environment.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).or_else(|| lookup(ENV_PUBLIC_API_URL))
            && !url.trim().is_empty()
        {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(code) = lookup(ENV_LANGUAGE) {
            config.language = code.parse()?;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError::Timeout(raw.clone()))?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Override the backend base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the session language.
    #[must_use]
    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Override the message length limit.
    #[must_use]
    pub fn max_message_chars(mut self, max: usize) -> Self {
        self.max_message_chars = max;
        self
    }

    /// Bound each request by a timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}
