#![deny(missing_docs)]
//! Shared types for the civic-chat client core.
//!
//! The decoder (`civic-stream`) produces [`StreamEvent`]s, the session
//! (`civic-session`) folds them into a transcript of [`ConversationEntry`]
//! values, and both report failures with the error enums in [`error`].

pub mod error;
pub mod stream;
pub mod types;

pub use error::*;
pub use stream::*;
pub use types::*;
