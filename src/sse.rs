//! Server-Sent Events (SSE) framing for the agent `/run_sse` stream.
//!
//! The stream is a sequence of blank-line separated frames. Only frames that
//! begin with `data:` carry a payload; everything else is skipped:
//! ```text
//! data: {"author": "root_agent"}
//!
//! data: {"content": {"parts": [{"text": "Hello"}]}}
//!
//! ```
//!
//! Transport chunks may split a frame, a JSON payload or even a UTF-8
//! character at any point. [`FrameBuffer`] owns the incomplete tail between
//! chunks so that only complete frames ever reach the parser.

use futures::StreamExt;

use crate::client::ClientError;
use crate::stream::{decode_events, EventStream};

/// Separator between two SSE frames.
pub const FRAME_DELIMITER: &str = "\n\n";

/// Prefix of frames that carry a payload.
pub const DATA_PREFIX: &str = "data:";

/// Accumulates transport chunks and splits them into complete frames.
///
/// A frame is only complete once its terminating delimiter has been seen.
/// Everything after the last delimiter stays buffered until more data arrives
/// and is dropped, never parsed, if the stream ends first.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buffer: String,
    /// Trailing bytes of a UTF-8 sequence that was cut by a chunk boundary.
    pending: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded text and return every frame it completes, in order.
    ///
    /// Consecutive delimiters produce empty frames; they are legal and simply
    /// yield no payload downstream.
    ///
    /// # Example
    /// ```
    /// use adk_client::sse::FrameBuffer;
    ///
    /// let mut buffer = FrameBuffer::new();
    /// assert!(buffer.accumulate("data: {\"a\":").is_empty());
    /// assert_eq!(buffer.accumulate("1}\n\nda"), vec!["data: {\"a\":1}".to_string()]);
    /// assert_eq!(buffer.remainder(), "da");
    /// ```
    pub fn accumulate(&mut self, chunk: &str) -> Vec<String> {
        // The buffered tail holds no complete delimiter, so a new one can
        // start at most one byte before the appended chunk.
        let mut search_from = self
            .buffer
            .len()
            .saturating_sub(FRAME_DELIMITER.len() - 1);
        while !self.buffer.is_char_boundary(search_from) {
            search_from -= 1;
        }
        self.buffer.push_str(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.buffer[search_from..].find(FRAME_DELIMITER) {
            let end = search_from + pos;
            frames.push(self.buffer[start..end].to_string());
            start = end + FRAME_DELIMITER.len();
            search_from = start;
        }
        self.buffer.drain(..start);

        frames
    }

    /// Decode raw transport bytes and return every frame they complete.
    ///
    /// A multi-byte character split across chunks is held back until the rest
    /// of it arrives. Invalid sequences are replaced with U+FFFD.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(chunk);

        let mut text = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk.
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        self.accumulate(&text)
    }

    /// Content received so far that does not yet belong to a complete frame.
    pub fn remainder(&self) -> &str {
        &self.buffer
    }
}

/// Extract the payload of a `data:` frame.
///
/// The prefix is matched literally and case-sensitively at the very start of
/// the frame. Comments, keepalives, `event:` lines and blank frames return
/// `None` and are not an error.
///
/// # Example
/// ```
/// use adk_client::sse::parse_frame;
///
/// assert_eq!(parse_frame("data: {\"key\": \"value\"}"), Some(" {\"key\": \"value\"}"));
/// assert_eq!(parse_frame(": keepalive"), None);
/// assert_eq!(parse_frame(" data: {}"), None);
/// ```
pub fn parse_frame(frame: &str) -> Option<&str> {
    frame.strip_prefix(DATA_PREFIX)
}

/// Extension trait for `reqwest::Response` to decode the agent event stream.
///
/// # Example
/// ```ignore
/// use adk_client::sse::SSEResponseExt;
///
/// let response = http.post(url).json(&body).send().await?;
/// let mut events = response.agent_events();
/// while let Some(event) = events.next().await {
///     println!("{}", event?);
/// }
/// ```
pub trait SSEResponseExt {
    /// Convert the response body into a stream of application events.
    ///
    /// Dropping the returned stream cancels the body read.
    fn agent_events(self) -> EventStream;
}

impl SSEResponseExt for reqwest::Response {
    fn agent_events(self) -> EventStream {
        decode_events(
            self.bytes_stream()
                .map(|chunk| chunk.map_err(|e| ClientError::StreamRead(e.to_string()))),
        )
    }
}
