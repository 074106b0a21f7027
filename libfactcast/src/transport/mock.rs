//! Recording transport for tests
//!
//! Replies are configured per URL and every request is kept for later
//! inspection. Requests to URLs with no configured reply get a 404.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{HttpResponse, JsonRequest, Transport};
use crate::error::TransportError;

#[derive(Debug, Clone)]
enum Reply {
    Respond(HttpResponse),
    Fail(TransportError),
}

#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    requests: Arc<Mutex<Vec<JsonRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request to `url` with `status` and `body`
    pub fn respond(self, url: &str, status: u16, body: impl Into<String>) -> Self {
        self.lock_replies()
            .insert(url.to_string(), Reply::Respond(HttpResponse::new(status, body)));
        self
    }

    /// Answer `url` with a successful OpenAI-style completion carrying `text`
    pub fn completion(self, url: &str, text: &str) -> Self {
        let body = serde_json::json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": text },
                "finish_reason": "stop"
            }]
        });
        self.respond(url, 200, body.to_string())
    }

    /// Fail every request to `url` before a status is received
    pub fn fail(self, url: &str, message: &str) -> Self {
        self.lock_replies().insert(
            url.to_string(),
            Reply::Fail(TransportError::Request(message.to_string())),
        );
        self
    }

    /// Every request sent so far, in order
    pub fn requests(&self) -> Vec<JsonRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn requests_to(&self, url: &str) -> Vec<JsonRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url == url)
            .collect()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, HashMap<String, Reply>> {
        self.replies.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(&self, request: JsonRequest) -> Result<HttpResponse, TransportError> {
        let reply = self.lock_replies().get(&request.url).cloned();
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(error)) => Err(error),
            None => Ok(HttpResponse::new(404, "no mock reply configured")),
        }
    }
}
