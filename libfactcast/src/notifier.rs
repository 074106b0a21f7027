//! Chat notifications through Slack's `chat.postMessage`

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::error::{NotifyError, Result};
use crate::transport::{JsonRequest, Transport};

/// Slack answers 200 even for rejected messages; `ok` says what happened
#[derive(Debug, Deserialize)]
struct SlackReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

pub struct Notifier {
    transport: Arc<dyn Transport>,
    url: String,
    token: SecretString,
}

impl Notifier {
    pub fn new(transport: Arc<dyn Transport>, url: impl Into<String>, token: SecretString) -> Self {
        Self {
            transport,
            url: url.into(),
            token,
        }
    }

    /// Send `message` to `channel`
    pub async fn notify(&self, channel: &str, message: &str) -> Result<()> {
        let request = JsonRequest::new(&self.url, json!({ "channel": channel, "text": message }))
            .bearer(self.token.expose_secret());

        let response = self
            .transport
            .post_json(request)
            .await
            .map_err(NotifyError::from)?;

        if !response.is_success() {
            return Err(NotifyError::Api {
                status: response.status,
                body: response.body,
            }
            .into());
        }

        // A body that isn't a Slack reply is taken as delivered
        if let Ok(reply) = serde_json::from_str::<SlackReply>(&response.body) {
            if !reply.ok {
                let reason = reply.error.unwrap_or_else(|| "unknown error".to_string());
                return Err(NotifyError::Rejected(reason).into());
            }
        }

        debug!(channel, "Notification sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FactcastError;
    use crate::transport::mock::MockTransport;

    const URL: &str = "https://slack.test/api/chat.postMessage";

    fn notifier(transport: &MockTransport) -> Notifier {
        Notifier::new(
            Arc::new(transport.clone()),
            URL,
            SecretString::from("xoxb-test".to_string()),
        )
    }

    #[tokio::test]
    async fn test_notify_posts_channel_and_text() {
        let transport = MockTransport::new().respond(URL, 200, r#"{"ok":true,"ts":"1.2"}"#);

        notifier(&transport)
            .notify("tweets", "Hey peeps, I just tweeted this: Fact A")
            .await
            .unwrap();

        let requests = transport.requests_to(URL);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].headers["Authorization"], "Bearer xoxb-test");
        assert_eq!(
            requests[0].body,
            json!({ "channel": "tweets", "text": "Hey peeps, I just tweeted this: Fact A" })
        );
    }

    #[tokio::test]
    async fn test_slack_ok_false_is_rejected() {
        let transport =
            MockTransport::new().respond(URL, 200, r#"{"ok":false,"error":"channel_not_found"}"#);

        let error = notifier(&transport).notify("nope", "hi").await.unwrap_err();
        match error {
            FactcastError::Notify(NotifyError::Rejected(reason)) => {
                assert_eq!(reason, "channel_not_found")
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let transport = MockTransport::new().respond(URL, 500, "internal error");
        let error = notifier(&transport).notify("tweets", "hi").await.unwrap_err();
        assert!(matches!(
            error,
            FactcastError::Notify(NotifyError::Api { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_non_slack_body_counts_as_delivered() {
        let transport = MockTransport::new().respond(URL, 200, "ok");
        assert!(notifier(&transport).notify("tweets", "hi").await.is_ok());
    }
}
