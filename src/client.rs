//! Completion client trait and error types.

use async_trait::async_trait;
use futures::TryStreamExt;
use nonempty::NonEmpty;
use reqwest::StatusCode;
use thiserror::Error;

use crate::model::{ChatMessage, CompletionRequest};
use crate::options::ModelOptions;
use crate::stream::{self, FragmentStream};
use crate::transport::Transport;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Read error: {0}")]
    Read(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not connected to a cloud account")]
    NotConnected,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Whether the failure came from the transport: a non-success status or a
    /// failed read. These end the current stream; a fresh call may succeed.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Http(_) | ClientError::Status { .. } | ClientError::Read(_)
        )
    }

    /// The HTTP status carried by a non-success response, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}

/// Streaming chat completion capability.
///
/// # Required Methods
/// - `model_options`: Accessor for the stored model options
/// - `request_stream`: Issues a fully specified request
///
/// # Provided Methods (with default implementations)
/// - `chat_stream`: Builds the request from the stored model options
/// - `chat`: Streams and concatenates the whole answer
#[async_trait]
pub trait StreamingClient: Send + Sync {
    /// Get reference to the model options field.
    fn model_options(&self) -> &ModelOptions;

    /// Issue `request` and return its fragments as they arrive.
    async fn request_stream(&self, request: &CompletionRequest)
        -> Result<FragmentStream, ClientError>;

    /// Stream an answer to `messages` using the stored model options.
    async fn chat_stream(
        &self,
        messages: NonEmpty<ChatMessage>,
    ) -> Result<FragmentStream, ClientError> {
        let request = self.model_options().request(messages);
        self.request_stream(&request).await
    }

    /// Stream an answer to `messages` and return the full text.
    ///
    /// Fails with the first stream error; text received before it is dropped.
    async fn chat(&self, messages: NonEmpty<ChatMessage>) -> Result<String, ClientError> {
        let fragments = self.chat_stream(messages).await?;
        fragments
            .try_fold(String::new(), |mut text, fragment| async move {
                text.push_str(fragment.as_str());
                Ok::<_, ClientError>(text)
            })
            .await
    }
}

/// Completion client over any [`Transport`].
///
/// The endpoint, credentials and model are the only things that differ
/// between call sites, so they live in the transport and the options.
pub struct CompletionClient<T> {
    transport: T,
    model_options: ModelOptions,
}

impl<T: Transport> CompletionClient<T> {
    pub fn new(transport: T, model_options: ModelOptions) -> Self {
        Self {
            transport,
            model_options,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: Transport> StreamingClient for CompletionClient<T> {
    fn model_options(&self) -> &ModelOptions {
        &self.model_options
    }

    async fn request_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<FragmentStream, ClientError> {
        stream::stream(request, &self.transport).await
    }
}
