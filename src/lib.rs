//! # infrasight - cloud inventory with streamed LLM analysis
//!
//! Collects a snapshot of a cloud account (instances, functions, databases,
//! clusters, caches, costs, logs), hands it to a chat completion endpoint
//! together with a question, and streams the answer back fragment by
//! fragment.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Incremental server-sent event decoding with per-frame fault isolation
//! - Transport and cloud access behind traits, so any endpoint or account
//!   backend plugs in
//! - Explicit application context instead of global state
//!
//! ## Architecture
//!
//! - **`stream`**: the streaming completion reader. Bytes in, text fragments out.
//! - **`transport`**: what a reader needs from the network (`Transport`, `ChunkReader`).
//! - **`client`**: `StreamingClient` on top of a transport plus model options.
//! - **`inventory`**, **`dashboard`**, **`logs`**: account data and the views built on it.
//! - **`context`**: `AppContext`, created once and passed around.
//!
//! ## Example
//! ```no_run
//! use futures::StreamExt;
//! use infrasight::client::{CompletionClient, StreamingClient};
//! use infrasight::config::AppConfig;
//! use infrasight::model::ChatMessage;
//! use infrasight::providers::OpenAiTransport;
//! use nonempty::nonempty;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let transport = OpenAiTransport::new(config.transport_options())?;
//!     let client = CompletionClient::new(transport, config.model_options());
//!
//!     let mut answer = client
//!         .chat_stream(nonempty![ChatMessage::user("Hello!")])
//!         .await?;
//!     while let Some(fragment) = answer.next().await {
//!         print!("{}", fragment?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod http;
pub mod inventory;
pub mod logs;
pub mod model;
pub mod options;
pub mod prompt;
pub mod providers;
pub mod sse;
pub mod stream;
pub mod transport;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use client::{ClientError, CompletionClient, StreamingClient};
pub use context::AppContext;
pub use model::{ChatMessage, CompletionRequest, ContentFragment, Role};
pub use stream::{stream, FragmentStream};
pub use transport::{ChunkReader, Transport, TransportResponse};
