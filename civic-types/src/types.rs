//! Conversation, session, and request types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The role of a transcript participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The resident typing into the chat.
    User,
    /// The chatbot reply.
    Assistant,
}

/// One entry of the conversation transcript.
///
/// The role is fixed at construction; only the session's pending entry ever
/// has its content replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    role: Role,
    /// Rendered text of the entry.
    pub content: String,
}

impl ConversationEntry {
    /// A user entry.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant entry.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Who wrote this entry.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }
}

/// Display language of a chat session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    #[default]
    En,
    /// Spanish.
    Es,
}

impl Language {
    /// The two-letter code sent to the backend.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// The chat bubble shown when a turn fails.
    #[must_use]
    pub fn turn_failed_message(self) -> &'static str {
        match self {
            Self::En => "Sorry, an error occurred. Please try again.",
            Self::Es => "Lo siento, ocurrió un error. Por favor intente de nuevo.",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing an unsupported language code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language code: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}

/// Per-session chat state.
///
/// `conversation_id` pins follow-up requests to the same backend
/// conversation and is never overwritten once set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Backend conversation identifier, learned from the first metadata event.
    pub conversation_id: Option<String>,
    /// Department the backend routed the conversation to.
    pub department: Option<String>,
    /// Whether a turn is currently receiving text.
    pub is_streaming: bool,
}

/// JSON body of the outbound chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message text.
    pub message: String,
    /// Conversation to continue, or `null` to start a new one.
    pub conversation_id: Option<String>,
    /// Response language.
    pub language: Language,
}
