//! Chat session core for civic-chat.
//!
//! A [`ChatSession`] owns one conversation transcript. Each
//! [`submit`](ChatSession::submit) appends the user's message, opens a request
//! through a [`ChatTransport`], decodes the streamed reply with
//! `civic-stream`, and grows the assistant entry chunk by chunk. Transport
//! failures become a localized chat bubble instead of an error.
//!
//! # Usage
//!
//! ```no_run
//! use civic_session::{ChatBackend, ChatConfig, ChatSession};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ChatConfig::from_env()?;
//! let backend = ChatBackend::from_config(&config);
//! let mut session = ChatSession::new(backend, config);
//!
//! let mut updates = session.subscribe();
//! tokio::spawn(async move {
//!     while updates.changed().await.is_ok() {
//!         let snapshot = updates.borrow().clone();
//!         if let Some(last) = snapshot.last() {
//!             println!("{}", last.content);
//!         }
//!     }
//! });
//!
//! session.submit("When is bulk trash pickup?").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod transcript;

pub use client::{ChatBackend, ChatTransport};
pub use config::{ChatConfig, ConfigError};
pub use session::{ChatSession, SessionSnapshot, TurnOutcome};
pub use transcript::Transcript;

// Re-export civic-types for convenience
pub use civic_types::{
    ByteStream, ChatRequest, ConversationEntry, Language, Role, SessionState, StreamEvent,
    TransportError, ValidationError,
};
