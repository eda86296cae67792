use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Source of raw config values. Production reads the process environment;
/// tests pass a map so they never mutate global state.
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Read a profiled key: tries {PROFILE}_{KEY} first, falls back to {KEY}.
/// Empty values count as unset.
fn profiled_opt(lookup: Lookup<'_>, profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = lookup(&prefixed).filter(|s| !s.is_empty()) {
            return Some(v);
        }
    }
    lookup(key).filter(|s| !s.is_empty())
}

fn profiled_or(lookup: Lookup<'_>, profile: &str, key: &str, default: &str) -> String {
    profiled_opt(lookup, profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_parse<T: std::str::FromStr>(
    lookup: Lookup<'_>,
    profile: &str,
    key: &str,
    default: T,
) -> T {
    profiled_opt(lookup, profile, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn profiled_bool(lookup: Lookup<'_>, profile: &str, key: &str, default: bool) -> bool {
    match profiled_opt(lookup, profile, key).map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v == "true" || v == "1" || v == "yes" => true,
        Some(v) if v == "false" || v == "0" || v == "no" => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub postgres: PostgresConfig,
    pub agent: AgentConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `TADA_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = process_env("TADA_PROFILE").unwrap_or_default();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        Self::from_lookup(profile, &process_env)
    }

    fn from_lookup(profile: &str, lookup: Lookup<'_>) -> Self {
        let p = profile.trim().to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            llm: LlmConfig::from_lookup(lookup, p),
            ollama: OllamaConfig::from_lookup(lookup, p),
            postgres: PostgresConfig::from_lookup(lookup, p),
            agent: AgentConfig::from_lookup(lookup, p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() {
            "default"
        } else {
            &self.profile
        }
    }

    /// Log a redacted summary at startup.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  llm:      provider={}, model={}, json_mode={}, configured={}",
            self.llm.provider,
            self.llm.model_for(&self.ollama),
            self.llm.json_mode,
            self.llm.is_configured()
        );
        tracing::info!(
            "  store:    {}",
            if self.postgres.is_configured() { "postgres" } else { "memory" }
        );
        tracing::info!(
            "  agent:    max_iterations={}, max_malformed_retries={}, max_tool_failures={}, timeout={}s",
            self.agent.max_iterations,
            self.agent.max_malformed_retries,
            self.agent.max_tool_failures,
            self.agent.inference_timeout_secs
        );
    }
}

// ── LLM (OpenAI / Anthropic / Ollama) ─────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "anthropic", "ollama"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider for JSON-only output where the API supports it.
    pub json_mode: bool,
}

impl LlmConfig {
    fn from_lookup(lookup: Lookup<'_>, p: &str) -> Self {
        Self {
            provider: profiled_or(lookup, p, "LLM_PROVIDER", "openai").to_lowercase(),
            openai_api_key: profiled_opt(lookup, p, "OPENAI_API_KEY"),
            openai_model: profiled_or(lookup, p, "OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: profiled_opt(lookup, p, "OPENAI_BASE_URL"),
            anthropic_api_key: profiled_opt(lookup, p, "ANTHROPIC_API_KEY"),
            anthropic_model: profiled_or(
                lookup,
                p,
                "ANTHROPIC_MODEL",
                "claude-sonnet-4-5-20250929",
            ),
            temperature: profiled_parse(lookup, p, "LLM_TEMPERATURE", 0.0),
            max_tokens: profiled_parse(lookup, p, "LLM_MAX_TOKENS", 1024),
            json_mode: profiled_bool(lookup, p, "LLM_JSON_MODE", true),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "anthropic" | "claude" => self.anthropic_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }

    /// The model name the active provider will use.
    pub fn model_for<'a>(&'a self, ollama: &'a OllamaConfig) -> &'a str {
        match self.provider.as_str() {
            "anthropic" | "claude" => &self.anthropic_model,
            "ollama" => &ollama.model,
            _ => &self.openai_model,
        }
    }

    /// Point the active provider at a different model.
    pub fn set_model(&mut self, ollama: &mut OllamaConfig, model: String) {
        match self.provider.as_str() {
            "anthropic" | "claude" => self.anthropic_model = model,
            "ollama" => ollama.model = model,
            _ => self.openai_model = model,
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl OllamaConfig {
    fn from_lookup(lookup: Lookup<'_>, p: &str) -> Self {
        Self {
            url: profiled_or(lookup, p, "OLLAMA_URL", "http://localhost:11434"),
            model: profiled_or(lookup, p, "OLLAMA_MODEL", "llama3.2"),
        }
    }
}

// ── PostgreSQL ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Full connection URL. Unset means the in-memory store is used.
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl PostgresConfig {
    fn from_lookup(lookup: Lookup<'_>, p: &str) -> Self {
        Self {
            database_url: profiled_opt(lookup, p, "DATABASE_URL"),
            max_connections: profiled_parse(lookup, p, "PG_MAX_CONNECTIONS", 5),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.database_url.is_some()
    }
}

// ── Agent loop limits ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Inference calls allowed per user turn.
    pub max_iterations: usize,
    /// Consecutive malformed model responses tolerated before the turn fails.
    pub max_malformed_retries: usize,
    /// Consecutive failing tool calls tolerated before the turn fails.
    pub max_tool_failures: usize,
    pub inference_timeout_secs: u64,
}

impl AgentConfig {
    fn from_lookup(lookup: Lookup<'_>, p: &str) -> Self {
        Self {
            max_iterations: profiled_parse(lookup, p, "AGENT_MAX_ITERATIONS", 10),
            max_malformed_retries: profiled_parse(lookup, p, "AGENT_MAX_MALFORMED_RETRIES", 3),
            max_tool_failures: profiled_parse(lookup, p, "AGENT_MAX_TOOL_FAILURES", 3),
            inference_timeout_secs: profiled_parse(lookup, p, "AGENT_INFERENCE_TIMEOUT_SECS", 60),
        }
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from_lookup(&|_: &str| None, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)], profile: &str) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(profile, &move |key: &str| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[], "");
        assert_eq!(config.profile_label(), "default");
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.openai_model, "gpt-4o-mini");
        assert!(config.llm.json_mode);
        assert!(!config.llm.is_configured());
        assert!(!config.postgres.is_configured());
        assert_eq!(config.agent.max_iterations, 10);
        assert_eq!(config.agent.max_malformed_retries, 3);
        assert_eq!(config.agent.max_tool_failures, 3);
        assert_eq!(config.agent.inference_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_profile_prefix_wins() {
        let config = config_from(
            &[
                ("OPENAI_MODEL", "gpt-4o"),
                ("PROD_OPENAI_MODEL", "gpt-4.1"),
                ("OPENAI_API_KEY", "sk-base"),
            ],
            "prod",
        );
        assert_eq!(config.profile, "PROD");
        assert_eq!(config.llm.openai_model, "gpt-4.1");
        // Falls back to the unprefixed key
        assert_eq!(config.llm.openai_api_key.as_deref(), Some("sk-base"));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = config_from(&[("DATABASE_URL", ""), ("OPENAI_API_KEY", "")], "");
        assert!(config.postgres.database_url.is_none());
        assert!(config.llm.openai_api_key.is_none());
    }

    #[test]
    fn test_unparseable_numbers_fall_back() {
        let config = config_from(
            &[("AGENT_MAX_ITERATIONS", "lots"), ("LLM_TEMPERATURE", "0.7")],
            "",
        );
        assert_eq!(config.agent.max_iterations, 10);
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_json_mode_toggle() {
        let config = config_from(&[("LLM_JSON_MODE", "false")], "");
        assert!(!config.llm.json_mode);
    }

    #[test]
    fn test_model_for_active_provider() {
        let mut config = config_from(&[("LLM_PROVIDER", "Ollama")], "");
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.llm.model_for(&config.ollama), "llama3.2");
        assert!(config.llm.is_configured());

        config.llm.set_model(&mut config.ollama, "qwen2.5".to_string());
        assert_eq!(config.llm.model_for(&config.ollama), "qwen2.5");
    }
}
