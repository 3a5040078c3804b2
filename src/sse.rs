//! Server-Sent Events (SSE) decoding.
//!
//! Bytes come off the wire in arbitrary chunks. They are decoded to text with
//! a stateful UTF-8 decoder, reassembled into complete lines, and each line is
//! classified as a data frame, the end-of-stream marker, or noise.
//!
//! SSE format:
//! ```text
//! data: {"key": "value"}
//!
//! data: {"another": "event"}
//!
//! data: [DONE]
//! ```

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";

/// Incremental UTF-8 decoder.
///
/// A multi-byte character split across two chunks is held back until the
/// rest of it arrives. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, carrying any incomplete trailing sequence forward.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut text = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
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
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }

    /// Number of bytes waiting for the rest of their character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Reassembles decoded text into complete lines.
///
/// Lines end at `"\n"`; a trailing `"\r"` is dropped. Text after the last
/// terminator stays buffered until a later chunk completes it.
#[derive(Debug, Default)]
pub struct LineDecoder {
    utf8: Utf8Decoder,
    buffer: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw chunk and return every line it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.utf8.decode(chunk);
        self.buffer.push_str(&text);

        let Some(end) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.buffer.split_off(end + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);
        complete.lines().map(str::to_string).collect()
    }

    /// Text (and undecoded bytes) seen after the last line terminator.
    pub fn remainder(&self) -> (&str, usize) {
        (&self.buffer, self.utf8.pending_len())
    }
}

/// What a single SSE line means to a completion stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// A `data: ` line carrying a payload.
    Data(&'a str),

    /// The `data: [DONE]` end-of-stream marker.
    Done,

    /// Anything else: blank separators, comments, heartbeats, other fields.
    Ignored,
}

impl<'a> Frame<'a> {
    /// Classify one complete line.
    ///
    /// # Example
    /// ```
    /// use infrasight::sse::Frame;
    ///
    /// assert_eq!(Frame::parse("data: {\"a\":1}"), Frame::Data("{\"a\":1}"));
    /// assert_eq!(Frame::parse("data: [DONE]"), Frame::Done);
    /// assert_eq!(Frame::parse(": keep-alive"), Frame::Ignored);
    /// ```
    pub fn parse(line: &'a str) -> Self {
        match parse_sse_line(line) {
            Some(data) if is_done_marker(data) => Frame::Done,
            Some(data) => Frame::Data(data),
            None => Frame::Ignored,
        }
    }
}

/// Parse an SSE line to extract the data portion.
///
/// SSE lines are in the format: `data: <content>`
///
/// # Example
/// ```
/// use infrasight::sse::parse_sse_line;
///
/// let line = "data: {\"key\": \"value\"}";
/// assert_eq!(parse_sse_line(line), Some("{\"key\": \"value\"}"));
///
/// let line = "invalid";
/// assert_eq!(parse_sse_line(line), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
}

/// Check if an SSE data line indicates the stream is done.
///
/// # Example
/// ```
/// use infrasight::sse::is_done_marker;
///
/// assert!(is_done_marker("[DONE]"));
/// assert!(!is_done_marker(""));
/// assert!(!is_done_marker("{\"data\": \"value\"}"));
/// ```
pub fn is_done_marker(data: &str) -> bool {
    data == DONE_MARKER
}
