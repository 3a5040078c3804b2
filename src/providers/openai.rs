//! OpenAI Chat Completions transport.
//!
//! Sends `POST {base_url}/chat/completions` with a bearer token and hands the
//! event-stream body back unread.
//! See: <https://platform.openai.com/docs/api-reference/chat/create-chat-completion>

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;

use crate::client::ClientError;
use crate::config::DEFAULT_BASE_URL;
use crate::http::{add_extra_headers, build_http_client, StreamReader};
use crate::model::{ChatMessage, CompletionRequest};
use crate::options::{HttpTransport, SecretString, TransportOptions};
use crate::transport::{Transport, TransportResponse};

/// OpenAI-compatible transport over HTTP.
#[derive(Debug, Clone)]
pub struct OpenAiTransport {
    http: reqwest::Client,
    api_key: SecretString,
    url: String,
    transport_options: TransportOptions<HttpTransport>,
}

impl OpenAiTransport {
    /// Build the transport; the HTTP client is created once and reused.
    pub fn new(transport_options: TransportOptions<HttpTransport>) -> Result<Self, ClientError> {
        // Validate API key is present
        let api_key = transport_options
            .provider
            .api_key
            .clone()
            .ok_or_else(|| ClientError::Config("API key is required".to_string()))?;

        let api_base = transport_options
            .provider
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');

        Ok(Self {
            http: build_http_client(&transport_options)?,
            api_key,
            url: format!("{}/chat/completions", api_base),
            transport_options,
        })
    }

    /// Endpoint the requests go to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for OpenAiTransport {
    type Reader = StreamReader;

    async fn send(
        &self,
        request: &CompletionRequest,
    ) -> Result<TransportResponse<Self::Reader>, ClientError> {
        let mut req = self
            .http
            .post(&self.url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key.expose_secret()))
            .header(CONTENT_TYPE, "application/json");

        req = add_extra_headers(req, &self.transport_options.provider.extra_headers);

        let response = req.json(&ChatCompletionBody::from(request)).send().await?;
        Ok(TransportResponse::new(
            response.status(),
            StreamReader::from_response(response),
        ))
    }
}

// --- OpenAI API Request Types ---

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<&'a ChatMessage>,
    temperature: f32,
    stream: bool,
}

impl<'a> From<&'a CompletionRequest> for ChatCompletionBody<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            messages: request.messages.iter().collect(),
            temperature: request.temperature,
            stream: request.stream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nonempty::nonempty;

    #[test]
    fn test_request_body_shape() {
        let request = CompletionRequest::new(
            "gpt-4",
            nonempty![ChatMessage::system("sys"), ChatMessage::user("question")],
        )
        .with_temperature(0.5);

        let body = serde_json::to_value(ChatCompletionBody::from(&request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "question"}
                ],
                "temperature": 0.5,
                "stream": true
            })
        );
    }

    #[test]
    fn test_url_from_base() {
        let transport = OpenAiTransport::new(TransportOptions::new(
            HttpTransport::new("sk-test").with_base_url("http://localhost:8080/v1/".to_string()),
        ))
        .unwrap();
        assert_eq!(transport.url(), "http://localhost:8080/v1/chat/completions");

        let transport = OpenAiTransport::new(TransportOptions::new(HttpTransport::new("sk-test"))).unwrap();
        assert_eq!(transport.url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_api_key_required() {
        let err = OpenAiTransport::new(TransportOptions::new(HttpTransport::default())).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
