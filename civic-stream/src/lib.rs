//! Decoder for the civic-chat response stream.
//!
//! The chat backend answers with newline-delimited records, each meaningful
//! record prefixed with `data: `:
//!
//! ```text
//! data: {"conversation_id":"7f1c","department":{"name":"Public Works","slug":"public-works"}}
//! data: {"text":"Bulk trash pickup "}
//! data: {"text":"is on the first Monday."}
//! data: [DONE]
//! ```
//!
//! [`FrameDecoder`] turns arbitrarily split byte chunks into [`StreamEvent`]s;
//! [`decode_stream`] drives it over an async byte stream.
//!
//! # Usage
//!
//! ```
//! use civic_stream::FrameDecoder;
//! use civic_types::StreamEvent;
//!
//! let mut decoder = FrameDecoder::new();
//! let mut events = decoder.push(b"data: {\"te");
//! events.extend(decoder.push(b"xt\":\"Hello\"}\n"));
//! events.extend(decoder.finish());
//! assert_eq!(events, vec![StreamEvent::text("Hello")]);
//! ```

pub mod decoder;
pub mod streaming;

pub use decoder::{FrameDecoder, parse_payload};
pub use streaming::decode_stream;

pub use civic_types::StreamEvent;
