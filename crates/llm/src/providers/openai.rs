use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{post_json, reply_text};
use crate::provider::{LlmError, LlmProvider, Message, Role};

/// OpenAI chat completions (and any compatible endpoint via `base_url`).
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    json_mode: bool,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url,
            json_mode: false,
        }
    }

    /// Request `response_format: json_object`. The model still may return
    /// invalid JSON; callers validate.
    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    fn build_request_body(
        &self,
        messages: &[Message],
        temperature: f32,
        max_tokens: u32,
    ) -> serde_json::Value {
        let api_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::System => "system",
                        Role::User => "user",
                        Role::Assistant => "assistant",
                        Role::Developer => "developer",
                    },
                    "content": m.content,
                })
            })
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        if self.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        body
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&messages, temperature, max_tokens);

        debug!(url = %url, messages = messages.len(), "OpenAI request");

        let request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key);
        let response = post_json(request, &body).await?;
        reply_text(&response, "/choices/0/message/content")
    }

    fn name(&self) -> &str {
        "openai"
    }
}
