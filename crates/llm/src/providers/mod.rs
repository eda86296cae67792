pub mod claude;
pub mod ollama;
pub mod openai;

use serde_json::Value;
use tada_core::config::{LlmConfig, OllamaConfig};

use crate::provider::{LlmError, LlmProvider, Message, Role};

/// Create the appropriate LLM provider based on config.
pub fn create_provider(
    llm_config: &LlmConfig,
    ollama_config: &OllamaConfig,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    match llm_config.provider.as_str() {
        "openai" => {
            let api_key = llm_config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            let base_url = llm_config
                .openai_base_url
                .as_deref()
                .unwrap_or("https://api.openai.com");
            Ok(Box::new(
                openai::OpenAiProvider::new(
                    api_key.clone(),
                    llm_config.openai_model.clone(),
                    base_url.trim_end_matches('/').to_string(),
                )
                .with_json_mode(llm_config.json_mode),
            ))
        }
        "anthropic" | "claude" => {
            let api_key = llm_config
                .anthropic_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("ANTHROPIC_API_KEY not set".into()))?;
            Ok(Box::new(claude::ClaudeProvider::new(
                api_key.clone(),
                llm_config.anthropic_model.clone(),
            )))
        }
        "ollama" => Ok(Box::new(
            ollama::OllamaProvider::new(
                ollama_config.url.trim_end_matches('/').to_string(),
                ollama_config.model.clone(),
            )
            .with_json_mode(llm_config.json_mode),
        )),
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{}'",
            other
        ))),
    }
}

/// Send `body` as JSON and decode the JSON reply. Any non-2xx status is
/// returned as `ApiError` with the raw response body.
async fn post_json(request: reqwest::RequestBuilder, body: &Value) -> Result<Value, LlmError> {
    let response = request.json(body).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::ApiError {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

/// User turn appended when a conversation ends on an assistant message.
/// Anthropic and Ollama treat a trailing assistant turn as a prefill and
/// would extend it instead of answering.
const CONTINUE_PROMPT: &str = "Continue. Reply with your next JSON message.";

/// Whether the request needs [`CONTINUE_PROMPT`] appended.
fn ends_on_assistant(messages: &[Message]) -> bool {
    messages.last().map(|m| m.role) == Some(Role::Assistant)
}

/// The reply text at `pointer` (JSON Pointer) in a provider response.
fn reply_text(response: &Value, pointer: &str) -> Result<String, LlmError> {
    response
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| LlmError::ParseError(format!("response has no text at {pointer}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            openai_base_url: None,
            anthropic_api_key: None,
            anthropic_model: "claude-sonnet-4-5-20250929".into(),
            temperature: 0.0,
            max_tokens: 1024,
            json_mode: true,
        }
    }

    fn ollama_config() -> OllamaConfig {
        OllamaConfig {
            url: "http://localhost:11434/".into(),
            model: "llama3.2".into(),
        }
    }

    #[test]
    fn test_openai_requires_key() {
        let err = create_provider(&llm_config("openai"), &ollama_config()).err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured(msg) if msg.contains("OPENAI_API_KEY")));
    }

    #[test]
    fn test_anthropic_requires_key() {
        let err = create_provider(&llm_config("anthropic"), &ollama_config()).err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured(msg) if msg.contains("ANTHROPIC_API_KEY")));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let provider = create_provider(&llm_config("ollama"), &ollama_config()).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_openai_with_key() {
        let mut config = llm_config("openai");
        config.openai_api_key = Some("sk-test".into());
        let provider = create_provider(&config, &ollama_config()).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_unknown_provider() {
        let err = create_provider(&llm_config("gemini"), &ollama_config()).err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured(msg) if msg.contains("gemini")));
    }

    #[test]
    fn test_reply_text_per_provider_shape() {
        let openai = serde_json::json!({"choices": [{"message": {"content": "{\"type\":\"output\"}"}}]});
        assert_eq!(
            reply_text(&openai, "/choices/0/message/content").unwrap(),
            "{\"type\":\"output\"}"
        );

        let anthropic = serde_json::json!({"content": [{"type": "text", "text": "hi"}]});
        assert_eq!(reply_text(&anthropic, "/content/0/text").unwrap(), "hi");

        let ollama = serde_json::json!({"message": {"role": "assistant", "content": "hey"}});
        assert_eq!(reply_text(&ollama, "/message/content").unwrap(), "hey");
    }

    #[test]
    fn test_ends_on_assistant() {
        let plan = Message::new(Role::Assistant, r#"{"type":"plan","plan":"list"}"#);
        assert!(ends_on_assistant(&[Message::new(Role::User, "hi"), plan.clone()]));
        assert!(!ends_on_assistant(&[plan, Message::new(Role::System, "note")]));
        assert!(!ends_on_assistant(&[]));
    }

    #[test]
    fn test_reply_text_missing() {
        let err = reply_text(&serde_json::json!({"choices": []}), "/choices/0/message/content")
            .unwrap_err();
        assert!(matches!(err, LlmError::ParseError(msg) if msg.contains("/choices/0")));
    }
}
