//! Newline-delimited JSON (NDJSON) stream processing.
//!
//! Streamed Ollama responses carry one complete JSON document per line:
//! ```text
//! {"model":"llama3","message":{"role":"assistant","content":"Hel"},"done":false}
//! {"model":"llama3","message":{"role":"assistant","content":"lo"},"done":false}
//! {"model":"llama3","done":true}
//! ```
//!
//! Blank lines are ignored. A line that fails to parse is logged and skipped;
//! it never ends the stream.

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;

use crate::client::ClientError;

/// Extension trait for `reqwest::Response` to read an NDJSON body.
pub trait NdjsonResponseExt {
    /// Convert the response body into a stream of parsed JSON documents.
    fn ndjson(self) -> impl Stream<Item = Result<Value, ClientError>> + Send;
}

impl NdjsonResponseExt for reqwest::Response {
    fn ndjson(self) -> impl Stream<Item = Result<Value, ClientError>> + Send {
        ndjson_documents(self.bytes_stream())
    }
}

/// Decode a raw byte stream into NDJSON documents.
///
/// Lines may be split across chunks arbitrarily. A transport error is yielded
/// once and terminates the stream.
pub fn ndjson_documents<S, E>(byte_stream: S) -> impl Stream<Item = Result<Value, ClientError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ClientError>,
{
    stream::unfold(
        (Box::pin(byte_stream), BytesMut::new(), false),
        |(mut byte_stream, mut buffer, mut stream_ended)| async move {
            loop {
                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line = buffer.split_to(pos + 1);
                    if let Some(doc) = parse_ndjson_line(&line) {
                        return Some((Ok(doc), (byte_stream, buffer, stream_ended)));
                    }
                }

                if stream_ended {
                    if buffer.is_empty() {
                        return None;
                    }
                    let rest = buffer.split();
                    if let Some(doc) = parse_ndjson_line(&rest) {
                        return Some((Ok(doc), (byte_stream, buffer, stream_ended)));
                    }
                    return None;
                }

                match byte_stream.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(e)) => {
                        buffer.clear();
                        stream_ended = true;
                        return Some((Err(e.into()), (byte_stream, buffer, stream_ended)));
                    }
                    None => stream_ended = true,
                }
            }
        },
    )
}

/// Parse one NDJSON line.
///
/// Returns `None` for blank lines and for lines that are not valid JSON.
pub fn parse_ndjson_line(line: &[u8]) -> Option<Value> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_slice::<Value>(line) {
        Ok(doc) => {
            tracing::debug!("Received stream chunk ({} bytes)", line.len());
            Some(doc)
        }
        Err(e) => {
            tracing::warn!(
                "Skipping malformed stream line: {} ({:?})",
                e,
                String::from_utf8_lossy(line)
            );
            None
        }
    }
}
