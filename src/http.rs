//! HTTP client utilities for making requests to completion APIs.
//!
//! This module provides reusable HTTP client construction, request header
//! handling and a [`ChunkReader`] over any byte stream, including a
//! `reqwest` response body.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;

use crate::client::ClientError;
use crate::options::{HttpTransport, TransportOptions};
use crate::transport::ChunkReader;

/// Build a configured HTTP client from transport options.
///
/// This applies common configuration like timeouts and proxies.
///
/// # Example
/// ```ignore
/// let client = build_http_client(&transport_options)?;
/// ```
pub fn build_http_client(
    transport_options: &TransportOptions<HttpTransport>,
) -> Result<Client, ClientError> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.provider.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ClientError::Config(format!("invalid proxy {}: {}", proxy_url, e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Add extra headers to a request if specified in transport options.
///
/// # Example
/// ```ignore
/// let mut req = client.post(url);
/// req = add_extra_headers(req, &transport_options.provider.extra_headers);
/// ```
pub fn add_extra_headers(
    mut request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    if let Some(headers) = extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}

/// [`ChunkReader`] over a boxed byte stream.
///
/// Releasing drops the stream, which for an HTTP body closes the connection
/// (or returns it to the pool once fully read).
pub struct StreamReader {
    inner: Option<BoxStream<'static, Result<Bytes, ClientError>>>,
}

impl StreamReader {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, ClientError>> + Send + 'static,
    {
        Self {
            inner: Some(stream.boxed()),
        }
    }

    /// Read the body of a `reqwest` response chunk by chunk.
    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(response.bytes_stream().map_err(ClientError::from))
    }

    /// Whether [`ChunkReader::release`] has run.
    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }
}

#[async_trait]
impl ChunkReader for StreamReader {
    async fn read(&mut self) -> Result<Option<Bytes>, ClientError> {
        match self.inner.as_mut() {
            Some(stream) => stream.next().await.transpose(),
            None => Err(ClientError::Read("reader already released".to_string())),
        }
    }

    fn release(&mut self) -> Result<(), ClientError> {
        self.inner.take();
        Ok(())
    }
}
