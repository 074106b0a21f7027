//! HTTP transport shared by the generation, posting and chat clients
//!
//! All three external services take a JSON POST and answer with a status and
//! a body. The clients build the request (URL, auth headers, payload) and
//! interpret the response; the transport only moves bytes. Swapping in
//! [`mock::MockTransport`] lets the whole routine run without a network.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::TransportError;

// Mock transport is available for all builds (not just tests) to support integration tests
pub mod mock;

/// An outgoing JSON POST
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: serde_json::Value,
}

impl JsonRequest {
    pub fn new(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            body,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }
}

/// Status and raw body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return whatever the server answered
    ///
    /// Non-2xx statuses are returned as responses, not errors; only failures
    /// to complete the exchange are `TransportError`s.
    async fn post_json(&self, request: JsonRequest) -> Result<HttpResponse, TransportError>;
}

/// Transport backed by `reqwest`
///
/// No request timeout is set; the connection relies on the client defaults.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, request: JsonRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.post(&request.url).json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
