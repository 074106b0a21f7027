//! Fact generation through an OpenAI-compatible chat completions API

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::BotConfig;
use crate::error::{GenerationError, Result};
use crate::store::FactStore;
use crate::transport::{JsonRequest, Transport};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for the chat completions endpoint
pub struct CompletionClient {
    transport: Arc<dyn Transport>,
    url: String,
    api_key: SecretString,
}

impl CompletionClient {
    pub fn new(transport: Arc<dyn Transport>, url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            transport,
            url: url.into(),
            api_key,
        }
    }

    /// Send `prompt` as the only user message and return the first choice verbatim
    #[instrument(skip_all, fields(model = %model))]
    pub async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        let body = serde_json::to_value(ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        })
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        let request = JsonRequest::new(&self.url, body).bearer(self.api_key.expose_secret());
        let response = self
            .transport
            .post_json(request)
            .await
            .map_err(GenerationError::from)?;

        if !response.is_success() {
            return Err(GenerationError::Api {
                status: response.status,
                body: response.body,
            }
            .into());
        }

        let completion: ChatCompletion = serde_json::from_str(&response.body)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::EmptyResponse.into())
    }
}

/// Substitute `{topic}` and the newline-joined history into the template
///
/// Placeholders are expanded in a single pass over the template, so braces
/// inside the topic or a stored fact reach the model untouched.
pub fn build_prompt(template: &str, topic: &str, history: &[String]) -> String {
    let history = history.join("\n");
    let mut prompt = String::with_capacity(template.len() + topic.len() + history.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        prompt.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{topic}") {
            prompt.push_str(topic);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{history}") {
            prompt.push_str(&history);
            rest = after;
        } else {
            prompt.push('{');
            rest = &tail[1..];
        }
    }
    prompt.push_str(rest);

    prompt
}

pub struct FactGenerator {
    store: FactStore,
    client: CompletionClient,
    bot: BotConfig,
}

impl FactGenerator {
    pub fn new(store: FactStore, client: CompletionClient, bot: BotConfig) -> Self {
        Self { store, client, bot }
    }

    /// Ask the model for one new fact, showing it the recent history
    pub async fn generate(&self) -> Result<String> {
        let history = self.store.list(self.bot.history_limit()).await?;
        let prompt = build_prompt(&self.bot.prompt, &self.bot.topic, &history);
        debug!(history = history.len(), "Prompt:\n{}", prompt);

        self.client.complete(&self.bot.model, &prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FactcastError;
    use crate::transport::mock::MockTransport;
    use serde_json::json;
    use tempfile::TempDir;

    const URL: &str = "https://llm.test/v1/chat/completions";

    fn client(transport: &MockTransport) -> CompletionClient {
        CompletionClient::new(
            Arc::new(transport.clone()),
            URL,
            SecretString::from("sk-test".to_string()),
        )
    }

    #[test]
    fn test_build_prompt_substitutes_topic_and_history() {
        let history = vec!["Fact one".to_string(), "Fact two".to_string()];
        let prompt = build_prompt(
            crate::config::DEFAULT_PROMPT,
            "an exceptional person from any period in human history",
            &history,
        );

        assert_eq!(
            prompt,
            "Give me a one-liner interesting fact about an exceptional person from any period in human history.\n\
These are the previous facts you've mentioned:\nFact one\nFact two\nDon't repeat yourself\n\
and keep it short but interesting."
        );
    }

    #[test]
    fn test_build_prompt_with_empty_history() {
        let prompt = build_prompt("About {topic}: [{history}]", "owls", &[]);
        assert_eq!(prompt, "About owls: []");
    }

    #[test]
    fn test_build_prompt_leaves_placeholders_inside_history_alone() {
        let history = vec!["Use the {topic} placeholder".to_string()];
        let prompt = build_prompt("{topic}|{history}", "owls", &history);
        assert_eq!(prompt, "owls|Use the {topic} placeholder");

        let prompt = build_prompt("{history}|{topic}", "the {history} tag", &history);
        assert_eq!(prompt, "Use the {topic} placeholder|the {history} tag");
    }

    #[test]
    fn test_build_prompt_keeps_unknown_braces() {
        let prompt = build_prompt("{ {topic} } {other}", "owls", &[]);
        assert_eq!(prompt, "{ owls } {other}");
    }

    #[tokio::test]
    async fn test_complete_sends_model_and_single_message() {
        let transport = MockTransport::new().completion(URL, "Owls can't move their eyes.");
        let text = client(&transport).complete("gpt-4", "Tell me about owls").await.unwrap();

        assert_eq!(text, "Owls can't move their eyes.");
        let requests = transport.requests_to(URL);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].headers["Authorization"], "Bearer sk-test");
        assert_eq!(
            requests[0].body,
            json!({
                "model": "gpt-4",
                "messages": [{ "role": "user", "content": "Tell me about owls" }]
            })
        );
    }

    #[tokio::test]
    async fn test_complete_takes_first_choice_verbatim() {
        let body = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "  first, untrimmed \n" } },
                { "message": { "role": "assistant", "content": "second" } }
            ]
        });
        let transport = MockTransport::new().respond(URL, 200, body.to_string());

        let text = client(&transport).complete("gpt-4", "hi").await.unwrap();
        assert_eq!(text, "  first, untrimmed \n");
    }

    #[tokio::test]
    async fn test_service_error_carries_status_and_body() {
        let transport = MockTransport::new().respond(URL, 429, r#"{"error":"rate limited"}"#);
        let result = client(&transport).complete("gpt-4", "hi").await;

        match result {
            Err(FactcastError::Generation(GenerationError::Api { status, body })) => {
                assert_eq!(status, 429);
                assert!(body.contains("rate limited"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let transport = MockTransport::new().respond(URL, 200, r#"{"choices":[]}"#);
        let result = client(&transport).complete("gpt-4", "hi").await;
        assert!(matches!(
            result,
            Err(FactcastError::Generation(GenerationError::EmptyResponse))
        ));
    }

    #[tokio::test]
    async fn test_null_content_is_an_error() {
        let transport = MockTransport::new().respond(
            URL,
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
        );
        let result = client(&transport).complete("gpt-4", "hi").await;
        assert!(matches!(
            result,
            Err(FactcastError::Generation(GenerationError::EmptyResponse))
        ));
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let transport = MockTransport::new().respond(URL, 200, "<html>");
        let result = client(&transport).complete("gpt-4", "hi").await;
        assert!(matches!(
            result,
            Err(FactcastError::Generation(GenerationError::MalformedResponse(_)))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = MockTransport::new().fail(URL, "dns failure");
        let result = client(&transport).complete("gpt-4", "hi").await;
        assert!(matches!(
            result,
            Err(FactcastError::Generation(GenerationError::Transport(_)))
        ));
    }

    #[tokio::test]
    async fn test_generate_feeds_history_window_into_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(crate::clock::FixedClock::new(chrono::Utc::now()));
        let store = FactStore::with_clock(temp_dir.path().join("tweets"), clock.clone());
        for body in ["old", "middle", "new"] {
            store.append(body).await.unwrap();
            clock.advance(chrono::Duration::seconds(1));
        }

        let transport = MockTransport::new().completion(URL, "Fresh fact");
        let bot = BotConfig {
            prompt: "{topic}|{history}".to_string(),
            topic: "owls".to_string(),
            history_window: 2,
            ..BotConfig::default()
        };
        let generator = FactGenerator::new(store, client(&transport), bot);

        assert_eq!(generator.generate().await.unwrap(), "Fresh fact");
        let requests = transport.requests_to(URL);
        assert_eq!(
            requests[0].body["messages"][0]["content"],
            "owls|middle\nnew"
        );
        assert_eq!(requests[0].body["model"], crate::config::DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_generate_with_unbounded_history() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(crate::clock::FixedClock::new(chrono::Utc::now()));
        let store = FactStore::with_clock(temp_dir.path().join("tweets"), clock.clone());
        for body in ["a", "b", "c"] {
            store.append(body).await.unwrap();
            clock.advance(chrono::Duration::seconds(1));
        }

        let transport = MockTransport::new().completion(URL, "d");
        let bot = BotConfig {
            prompt: "{history}".to_string(),
            history_window: 1,
            unbounded_history: true,
            ..BotConfig::default()
        };
        FactGenerator::new(store, client(&transport), bot)
            .generate()
            .await
            .unwrap();

        assert_eq!(
            transport.requests_to(URL)[0].body["messages"][0]["content"],
            "a\nb\nc"
        );
    }
}
