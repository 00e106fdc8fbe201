//! Line buffering and per-frame parsing.

use civic_types::StreamEvent;
use serde::Deserialize;
use serde_json::Value;

/// Prefix of every record the decoder acts on.
const DATA_PREFIX: &[u8] = b"data: ";

/// Payload marking the end of the reply.
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental decoder for one response stream.
///
/// Bytes are buffered until a full line has arrived, so records split across
/// chunks (including inside a multi-byte character or inside the `data: `
/// prefix) decode exactly as if they had arrived in one piece. Lines are cut on
/// the `\n` byte, which never occurs inside a UTF-8 multi-byte sequence, and
/// only complete lines are decoded.
///
/// A decoder serves a single request: [`finish`](Self::finish) consumes it.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes of the current, not yet terminated line.
    line_buf: Vec<u8>,
    /// Whether a `[DONE]` payload has been seen.
    saw_done: bool,
}

impl FrameDecoder {
    /// Create a decoder with an empty line buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return the events of every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if chunk.is_empty() {
            return Vec::new();
        }
        self.line_buf.extend_from_slice(chunk);

        let Some(last_newline) = self.line_buf.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        // Keep the unterminated tail buffered for the next chunk
        let tail = self.line_buf.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.line_buf, tail);

        complete[..last_newline]
            .split(|&b| b == b'\n')
            .filter_map(|line| self.process_line(line))
            .collect()
    }

    /// Signal end of input and flush a trailing unterminated record.
    pub fn finish(mut self) -> Vec<StreamEvent> {
        let line = std::mem::take(&mut self.line_buf);
        self.process_line(&line).into_iter().collect()
    }

    /// Whether a `[DONE]` payload has been observed so far.
    #[must_use]
    pub fn saw_done(&self) -> bool {
        self.saw_done
    }

    fn process_line(&mut self, line: &[u8]) -> Option<StreamEvent> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        // Comments, `event:` lines and blank separators carry no payload.
        let payload = line.strip_prefix(DATA_PREFIX)?;
        let payload = String::from_utf8_lossy(payload);

        if is_done(&payload) {
            self.saw_done = true;
            return None;
        }
        parse_payload(&payload)
    }
}

fn is_done(payload: &str) -> bool {
    payload.trim() == DONE_SENTINEL
}

/// The two JSON frame shapes the backend sends.
#[derive(Deserialize)]
#[serde(untagged)]
enum Frame {
    Metadata {
        conversation_id: String,
        #[serde(default)]
        department: Option<Value>,
    },
    Text {
        text: String,
    },
}

/// Parse one frame payload into an event.
///
/// Returns `None` only for the `[DONE]` sentinel. Payloads that are not a
/// JSON object of a known shape come back as [`StreamEvent::TextChunk`]
/// carrying the raw payload.
#[must_use]
pub fn parse_payload(payload: &str) -> Option<StreamEvent> {
    if is_done(payload) {
        return None;
    }

    let frame = serde_json::from_str::<Value>(payload)
        .ok()
        .filter(Value::is_object)
        .and_then(|value| serde_json::from_value::<Frame>(value).ok());

    let event = match frame {
        Some(Frame::Metadata {
            conversation_id,
            department,
        }) => StreamEvent::Metadata {
            conversation_id,
            department: department.as_ref().and_then(normalize_department),
        },
        Some(Frame::Text { text }) => StreamEvent::TextChunk { text },
        None => {
            tracing::trace!(len = payload.len(), "civic.stream.raw_text_frame");
            StreamEvent::TextChunk {
                text: payload.to_string(),
            }
        }
    };
    Some(event)
}

/// Reduce a `department` field to a display name.
///
/// A string is used as is; an object yields its `name`, falling back to its
/// `slug`. Empty strings count as absent.
fn normalize_department(value: &Value) -> Option<String> {
    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    match value {
        Value::String(name) if !name.is_empty() => Some(name.clone()),
        Value::Object(fields) => non_empty(fields.get("name")).or_else(|| non_empty(fields.get("slug"))),
        _ => None,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
