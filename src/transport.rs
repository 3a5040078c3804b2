//! Transport capability: issue a completion request, read the body back in chunks.
//!
//! A transport only moves bytes. Decoding the event stream is the job of
//! [`crate::stream`], so the same reader works for any endpoint or test double.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;

use crate::client::ClientError;
use crate::model::CompletionRequest;

/// Incremental reader over a response body.
///
/// Chunks arrive in order, without duplication. `Ok(None)` signals the end of
/// the body.
#[async_trait]
pub trait ChunkReader: Send {
    /// Read the next chunk of the body.
    async fn read(&mut self) -> Result<Option<Bytes>, ClientError>;

    /// Give the underlying connection back.
    ///
    /// Called exactly once per reader by the stream that owns it, on every
    /// exit path.
    fn release(&mut self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Status line plus a body reader, as handed back by [`Transport::send`].
pub struct TransportResponse<R> {
    pub status: StatusCode,
    pub reader: R,
}

impl<R> TransportResponse<R> {
    pub fn new(status: StatusCode, reader: R) -> Self {
        Self { status, reader }
    }
}

/// Something that can deliver a [`CompletionRequest`] and stream back the body.
///
/// # Example
/// ```rust,ignore
/// struct MyTransport { /* ... */ }
///
/// #[async_trait]
/// impl Transport for MyTransport {
///     type Reader = StreamReader;
///
///     async fn send(
///         &self,
///         request: &CompletionRequest,
///     ) -> Result<TransportResponse<Self::Reader>, ClientError> {
///         // Issue the request, wrap the body
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Body reader type for this transport.
    type Reader: ChunkReader + 'static;

    /// Issue `request`. A non-success status is not an error at this level;
    /// the caller decides what to do with it.
    async fn send(
        &self,
        request: &CompletionRequest,
    ) -> Result<TransportResponse<Self::Reader>, ClientError>;
}
