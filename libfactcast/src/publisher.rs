//! Publishing facts to the X (Twitter) v2 API

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::credentials::OAuthCredentials;
use crate::error::{PublishError, Result};
use crate::oauth::OAuthSigner;
use crate::transport::{JsonRequest, Transport};

/// The only status the tweet-creation endpoint answers on success
pub const CREATED: u16 = 201;

pub struct Publisher {
    transport: Arc<dyn Transport>,
    url: String,
    credentials: OAuthCredentials,
}

impl Publisher {
    pub fn new(
        transport: Arc<dyn Transport>,
        url: impl Into<String>,
        credentials: OAuthCredentials,
    ) -> Self {
        Self {
            transport,
            url: url.into(),
            credentials,
        }
    }

    /// Post `body` as a new tweet
    ///
    /// # Errors
    ///
    /// Anything but `201 Created` is `PublishError::Rejected` carrying the
    /// status and the response body verbatim. Nothing is retried, so calling
    /// this again after an ambiguous failure may post twice.
    pub async fn publish(&self, body: &str) -> Result<()> {
        let authorization = OAuthSigner::new(&self.credentials).authorization("POST", &self.url)?;
        let request =
            JsonRequest::new(&self.url, json!({ "text": body })).header("Authorization", authorization);

        let response = self
            .transport
            .post_json(request)
            .await
            .map_err(PublishError::from)?;

        if response.status != CREATED {
            return Err(PublishError::Rejected {
                status: response.status,
                body: response.body,
            }
            .into());
        }

        match serde_json::from_str::<serde_json::Value>(&response.body) {
            Ok(value) => info!(
                "Published:\n{}",
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| response.body.clone())
            ),
            Err(_) => debug!(body = %response.body, "Published with non-JSON response"),
        }

        Ok(())
    }
}
