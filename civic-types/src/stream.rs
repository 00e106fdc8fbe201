//! Streaming event types for incremental chat replies.

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;

use crate::error::TransportError;

/// An event decoded from one frame of the chat response stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Conversation metadata, normally the first frame of a stream.
    Metadata {
        /// Backend conversation identifier.
        conversation_id: String,
        /// Department name the query was routed to, if any.
        department: Option<String>,
    },
    /// Incremental reply text.
    TextChunk {
        /// The text fragment, in arrival order.
        text: String,
    },
    /// Explicit end of the reply.
    Terminal,
}

impl StreamEvent {
    /// Shorthand for a [`StreamEvent::TextChunk`].
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextChunk { text: text.into() }
    }
}

/// A response body delivered as a sequence of byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;
