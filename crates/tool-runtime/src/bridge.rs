//! Bridge adapter: wraps a simple `SimpleLlmProvider` into an `InferenceProvider`.
//!
//! The `SimpleLlmProvider` trait is a minimal chat-completion interface defined
//! here in tool-runtime to avoid a dependency on `crates/llm`. The CLI wraps
//! any `tada_llm::LlmProvider` as a `SimpleLlmProvider`, so every existing
//! provider works unchanged.

use async_trait::async_trait;

use crate::provider::{InferenceError, InferenceProvider};
use crate::transcript::{EntryRole, TranscriptEntry};

/// A simple chat message for non-streaming LLM providers.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleMessage {
    pub role: SimpleRole,
    pub content: String,
}

/// Role in a chat conversation. `Tool` carries observations; providers map
/// it to whatever their API uses for out-of-band tool output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Minimal non-streaming LLM provider trait.
#[async_trait]
pub trait SimpleLlmProvider: Send + Sync {
    /// Send a chat completion request and return the assistant's response text.
    async fn complete(
        &self,
        messages: Vec<SimpleMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, InferenceError>;
}

/// Wraps a `SimpleLlmProvider` into an `InferenceProvider`, converting
/// transcript entries to chat messages one for one.
pub struct LlmProviderBridge {
    inner: Box<dyn SimpleLlmProvider>,
    name: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmProviderBridge {
    /// Create a bridge from any `SimpleLlmProvider`.
    pub fn new(inner: Box<dyn SimpleLlmProvider>, name: String) -> Self {
        Self {
            inner,
            name,
            temperature: 0.0,
            max_tokens: 1024,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

fn to_simple_message(entry: &TranscriptEntry) -> SimpleMessage {
    let role = match entry.role {
        EntryRole::System => SimpleRole::System,
        EntryRole::User => SimpleRole::User,
        EntryRole::Assistant => SimpleRole::Assistant,
        EntryRole::ToolResult => SimpleRole::Tool,
    };
    SimpleMessage {
        role,
        content: entry.content.clone(),
    }
}

#[async_trait]
impl InferenceProvider for LlmProviderBridge {
    async fn complete(&self, transcript: &[TranscriptEntry]) -> Result<String, InferenceError> {
        let messages = transcript.iter().map(to_simple_message).collect();
        self.inner
            .complete(messages, self.temperature, self.max_tokens)
            .await
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}
