//! Stream an answer from the configured chat completion endpoint.
//!
//! Run with:
//! ```bash
//! export OPENAI_API_KEY="your-api-key"
//! cargo run --example stream_chat -- "Explain reserved instances in two sentences."
//! ```

use futures::StreamExt;
use infrasight::client::{CompletionClient, StreamingClient};
use infrasight::config::AppConfig;
use infrasight::model::ChatMessage;
use infrasight::providers::OpenAiTransport;
use nonempty::nonempty;
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let question = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let question = if question.trim().is_empty() {
        "What are three quick ways to cut an AWS bill?".to_string()
    } else {
        question
    };

    // Configuration is loaded once and passed down explicitly
    let config = AppConfig::from_env()?;
    let transport = OpenAiTransport::new(config.transport_options())?;
    let client = CompletionClient::new(transport, config.model_options());

    let messages = nonempty![
        ChatMessage::system("You are an AWS infrastructure expert assistant."),
        ChatMessage::user(question)
    ];

    println!("Streaming response from {}...\n", config.openai.model);

    match client.chat_stream(messages).await {
        Ok(mut stream) => {
            while let Some(fragment) = stream.next().await {
                match fragment {
                    Ok(fragment) => {
                        print!("{}", fragment);
                        std::io::stdout().flush()?;
                    }
                    Err(e) => {
                        eprintln!("\nError in stream: {}", e);
                        return Err(e.into());
                    }
                }
            }
            println!();
        }
        Err(e) => {
            eprintln!("Error starting stream: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
