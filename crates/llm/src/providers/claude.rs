use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{ends_on_assistant, post_json, reply_text, CONTINUE_PROMPT};
use crate::provider::{LlmError, LlmProvider, Message, Role};

/// Anthropic Messages API. There is no JSON mode, so output shape relies on
/// the system prompt alone.
pub struct ClaudeProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ClaudeProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    /// Claude takes the system prompt as a separate field. Only the leading
    /// system messages go there; later ones (corrective notes) become user
    /// turns in place, as do developer messages. A conversation ending on
    /// an assistant turn gets a trailing user turn so it is not read as a
    /// prefill.
    fn build_request_body(
        model: &str,
        messages: &[Message],
        temperature: f32,
        max_tokens: u32,
    ) -> serde_json::Value {
        let leading = messages
            .iter()
            .take_while(|m| m.role == Role::System)
            .count();
        let system: Vec<&str> = messages[..leading]
            .iter()
            .map(|m| m.content.as_str())
            .collect();

        let mut api_messages: Vec<serde_json::Value> = messages[leading..]
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::Assistant => "assistant",
                        _ => "user",
                    },
                    "content": m.content,
                })
            })
            .collect();
        if ends_on_assistant(messages) {
            api_messages.push(json!({ "role": "user", "content": CONTINUE_PROMPT }));
        }

        let mut body = json!({
            "model": model,
            "messages": api_messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }

        body
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = "https://api.anthropic.com/v1/messages";
        let body = Self::build_request_body(&self.model, &messages, temperature, max_tokens);

        debug!(url = %url, messages = messages.len(), "Anthropic request");

        let request = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01");
        let response = post_json(request, &body).await?;
        reply_text(&response, "/content/0/text")
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
