use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{ends_on_assistant, post_json, reply_text, CONTINUE_PROMPT};
use crate::provider::{LlmError, LlmProvider, Message, Role};

pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    json_mode: bool,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            model,
            json_mode: false,
        }
    }

    /// Constrain output with Ollama's `format: "json"`.
    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    /// A trailing assistant turn is followed by a user turn, since
    /// `/api/chat` would otherwise continue it.
    fn build_request_body(
        &self,
        messages: &[Message],
        temperature: f32,
        max_tokens: u32,
    ) -> serde_json::Value {
        let mut api_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::System => "system",
                        Role::User | Role::Developer => "user",
                        Role::Assistant => "assistant",
                    },
                    "content": m.content,
                })
            })
            .collect();
        if ends_on_assistant(messages) {
            api_messages.push(json!({ "role": "user", "content": CONTINUE_PROMPT }));
        }

        let mut body = json!({
            "model": self.model,
            "messages": api_messages,
            "stream": false,
            "options": {
                "temperature": temperature,
                "num_predict": max_tokens,
            },
        });

        if self.json_mode {
            body["format"] = json!("json");
        }

        body
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.url);
        let body = self.build_request_body(&messages, temperature, max_tokens);

        debug!(url = %url, messages = messages.len(), "Ollama request");

        let request = self.client.post(&url);
        let response = post_json(request, &body).await?;
        reply_text(&response, "/message/content")
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
