//! Streaming completion reader.
//!
//! Turns a chat completion response body into the text fragments it carries.
//! The body is a server-sent event stream; each `data: ` line holds a JSON
//! chunk whose `choices[0].delta.content` is the next piece of the answer,
//! and `data: [DONE]` ends it.
//!
//! Behavior at the edges:
//! - a `data: ` payload that is not valid JSON is logged and skipped
//! - the body closing without `[DONE]` ends the stream normally
//! - a read failure ends the stream with that error, after any fragments
//!   already delivered
//! - the body reader is released exactly once however the stream ends,
//!   including when the consumer drops it early

use futures::stream::{self, Stream};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::ClientError;
use crate::model::{CompletionRequest, ContentFragment};
use crate::sse::{Frame, LineDecoder};
use crate::transport::{ChunkReader, Transport};

/// Fragments of one completion, in arrival order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<ContentFragment, ClientError>> + Send>>;

/// Cap on how much of an error body is kept for the error message.
const MAX_ERROR_BODY: usize = 64 * 1024;

/// How long a failed response may take to deliver its body.
const ERROR_BODY_TIMEOUT: Duration = Duration::from_millis(500);

/// Issue `request` over `transport` and stream back the answer.
///
/// The request always goes out with streaming enabled. A non-success status
/// fails here, before any fragment is produced.
///
/// # Example
/// ```ignore
/// let mut fragments = stream(&request, &transport).await?;
/// while let Some(fragment) = fragments.next().await {
///     print!("{}", fragment?);
/// }
/// ```
pub async fn stream<T>(
    request: &CompletionRequest,
    transport: &T,
) -> Result<FragmentStream, ClientError>
where
    T: Transport + ?Sized,
{
    let request = if request.stream {
        Cow::Borrowed(request)
    } else {
        Cow::Owned(request.clone().with_stream(true))
    };

    debug!(
        model = %request.model,
        messages = request.messages.len(),
        "issuing streaming completion request"
    );
    let response = transport.send(&request).await?;

    if !response.status.is_success() {
        let status = response.status;
        let body = read_error_body(response.reader).await;
        warn!(%status, "completion request failed");
        return Err(ClientError::Status {
            status,
            message: error_message(&body),
        });
    }

    Ok(Box::pin(read_fragments(response.reader)))
}

/// Decode a response body into content fragments.
///
/// Lazy: nothing is read until the stream is polled.
pub fn read_fragments<R>(reader: R) -> impl Stream<Item = Result<ContentFragment, ClientError>> + Send
where
    R: ChunkReader + 'static,
{
    stream::unfold(ReadState::new(reader), |mut state| async move {
        loop {
            while let Some(line) = state.lines.pop_front() {
                match Frame::parse(&line) {
                    Frame::Done => {
                        debug!("completion stream finished");
                        return None;
                    }
                    Frame::Data(payload) => match extract_content(payload) {
                        Ok(Some(text)) => {
                            return Some((Ok(ContentFragment::new(text)), state));
                        }
                        Ok(None) => {}
                        Err(e) => warn!(error = %e, %line, "skipping malformed stream frame"),
                    },
                    Frame::Ignored => {}
                }
            }

            let reader = state.reader.as_mut()?;
            match reader.read().await {
                Ok(Some(chunk)) => {
                    let lines = state.decoder.push(&chunk);
                    state.lines.extend(lines);
                }
                Ok(None) => {
                    let (partial, undecoded) = state.decoder.remainder();
                    if !partial.is_empty() || undecoded > 0 {
                        debug!(
                            partial_len = partial.len(),
                            undecoded,
                            "completion stream closed mid-line, discarding remainder"
                        );
                    }
                    return None;
                }
                Err(e) => {
                    state.reader = None;
                    return Some((Err(e), state));
                }
            }
        }
    })
}

/// Pull the content delta out of one `data: ` payload.
///
/// Returns `Ok(None)` for well-formed chunks without text (role
/// announcements, finish markers, empty deltas).
///
/// # Example
/// ```
/// use infrasight::stream::extract_content;
///
/// let payload = r#"{"choices":[{"delta":{"content":"Hi"}}]}"#;
/// assert_eq!(extract_content(payload).unwrap(), Some("Hi".to_string()));
///
/// let payload = r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
/// assert_eq!(extract_content(payload).unwrap(), None);
///
/// assert!(extract_content("{not json").is_err());
/// ```
pub fn extract_content(payload: &str) -> Result<Option<String>, serde_json::Error> {
    let chunk: ChatCompletionChunk = serde_json::from_str(payload)?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

struct ReadState<R: ChunkReader> {
    reader: Option<ReleaseGuard<R>>,
    decoder: LineDecoder,
    lines: VecDeque<String>,
}

impl<R: ChunkReader> ReadState<R> {
    fn new(reader: R) -> Self {
        Self {
            reader: Some(ReleaseGuard(reader)),
            decoder: LineDecoder::new(),
            lines: VecDeque::new(),
        }
    }
}

/// Owns a reader and releases it when dropped.
struct ReleaseGuard<R: ChunkReader>(R);

impl<R: ChunkReader> std::ops::Deref for ReleaseGuard<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.0
    }
}

impl<R: ChunkReader> std::ops::DerefMut for ReleaseGuard<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.0
    }
}

impl<R: ChunkReader> Drop for ReleaseGuard<R> {
    fn drop(&mut self) {
        if let Err(e) = self.0.release() {
            warn!(error = %e, "failed to release response reader");
        }
    }
}

/// Read what a failed response delivers within [`ERROR_BODY_TIMEOUT`], for the
/// error message. A stalled body never holds up the status error.
async fn read_error_body<R: ChunkReader>(reader: R) -> String {
    let mut reader = ReleaseGuard(reader);
    let mut body = Vec::new();
    let read = async {
        while body.len() < MAX_ERROR_BODY {
            match reader.read().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    debug!(error = %e, "could not read error body");
                    break;
                }
            }
        }
    };
    if tokio::time::timeout(ERROR_BODY_TIMEOUT, read).await.is_err() {
        debug!(received = body.len(), "error body stalled, giving up on it");
    }
    body.truncate(MAX_ERROR_BODY);
    String::from_utf8_lossy(&body).into_owned()
}

/// Prefer the message from an `{"error": {...}}` envelope over the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => format!(
            "OpenAI error ({}): {}",
            envelope.error.error_type.as_deref().unwrap_or("unknown"),
            envelope.error.message
        ),
        Err(_) => body.to_string(),
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: String,
}
