//! Bridge between `tada_llm` providers and the agent loop's `InferenceProvider`.
//!
//! The `LlmProviderBridge` adapter lives in `crates/tool-runtime` for reuse.
//! This module supplies the `SimpleLlmProvider` impl for `tada_llm` providers
//! and the factory that builds one from config.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;

use tada_core::Config;
use tada_llm::{create_provider, LlmError, LlmProvider, Message, Role};
use tada_tool_runtime::{
    InferenceError, InferenceProvider, LlmProviderBridge, SimpleLlmProvider, SimpleMessage,
    SimpleRole,
};

/// Wraps any `tada_llm::LlmProvider` as a `SimpleLlmProvider`.
pub struct LlmProviderAdapter(pub Box<dyn LlmProvider>);

fn to_llm_message(message: SimpleMessage) -> Message {
    let role = match message.role {
        SimpleRole::System => Role::System,
        SimpleRole::User => Role::User,
        SimpleRole::Assistant => Role::Assistant,
        SimpleRole::Tool => Role::Developer,
    };
    Message::new(role, message.content)
}

fn to_inference_error(err: LlmError) -> InferenceError {
    match err {
        LlmError::HttpError(e) => InferenceError::NetworkError(e.to_string()),
        LlmError::ApiError { status, body } => InferenceError::ApiError {
            status,
            message: body,
        },
        LlmError::ParseError(msg) => InferenceError::InvalidResponse(msg),
        LlmError::NotConfigured(msg) => InferenceError::Other(msg),
    }
}

#[async_trait]
impl SimpleLlmProvider for LlmProviderAdapter {
    async fn complete(
        &self,
        messages: Vec<SimpleMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, InferenceError> {
        let messages = messages.into_iter().map(to_llm_message).collect();
        self.0
            .complete(messages, temperature, max_tokens)
            .await
            .map_err(to_inference_error)
    }
}

/// Create the inference provider for the configured LLM backend.
pub fn create_inference_provider(config: &Config) -> anyhow::Result<Arc<dyn InferenceProvider>> {
    let llm = create_provider(&config.llm, &config.ollama)
        .with_context(|| format!("cannot use LLM provider '{}'", config.llm.provider))?;
    let name = llm.name().to_string();

    Ok(Arc::new(
        LlmProviderBridge::new(Box::new(LlmProviderAdapter(llm)), name)
            .with_temperature(config.llm.temperature)
            .with_max_tokens(config.llm.max_tokens),
    ))
}
