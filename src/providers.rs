//! Completion endpoint transports.

pub mod openai;

// Re-export for convenience
pub use openai::OpenAiTransport;
