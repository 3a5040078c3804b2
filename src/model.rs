//! Chat messages, completion requests and the fragments streamed back.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of the message sender.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a conversation.
///
/// Serializes to the `{"role": ..., "content": ...}` shape used on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A chat completion request.
///
/// Messages are kept in conversation order; the list can never be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier (e.g., "gpt-4")
    pub model: String,

    /// Conversation, in order
    pub messages: NonEmpty<ChatMessage>,

    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: f32,

    /// Ask the server to stream the answer as server-sent events
    pub stream: bool,
}

impl CompletionRequest {
    /// Create a streaming request with the default temperature.
    pub fn new(model: impl Into<String>, messages: NonEmpty<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: crate::options::DEFAULT_TEMPERATURE,
            stream: true,
        }
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Enable or disable streaming.
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

/// One incremental piece of generated text.
///
/// Fragments concatenated in delivery order form the complete answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFragment(String);

impl ContentFragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ContentFragment> for String {
    fn from(fragment: ContentFragment) -> Self {
        fragment.0
    }
}
