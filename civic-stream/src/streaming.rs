//! Async adapter driving a [`FrameDecoder`] over a byte stream.

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::decoder::FrameDecoder;
use civic_types::StreamEvent;

/// Decode a fallible byte stream into a stream of [`StreamEvent`]s.
///
/// Events are yielded as soon as the line carrying them is complete. When the
/// byte stream ends the decoder is flushed and the event stream ends too. A
/// read error is yielded once and ends the stream; frames already decoded are
/// never retracted.
pub fn decode_stream<S, E>(byte_stream: S) -> impl Stream<Item = Result<StreamEvent, E>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
{
    async_stream::stream! {
        let mut decoder = FrameDecoder::new();
        let mut bytes_stream = std::pin::pin!(byte_stream);

        while let Some(chunk_result) = bytes_stream.next().await {
            let chunk = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            for event in decoder.push(&chunk) {
                yield Ok(event);
            }
        }

        if decoder.saw_done() {
            tracing::trace!("civic.stream.done_sentinel");
        }
        for event in decoder.finish() {
            yield Ok(event);
        }
    }
}
