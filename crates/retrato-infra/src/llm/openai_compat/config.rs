//! Configuration and per-provider defaults for OpenAI-compatible providers.

use secrecy::SecretString;

/// Configuration for an OpenAI-compatible LLM provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "openrouter").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://openrouter.ai/api/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Model identifier (e.g., "deepseek/deepseek-chat").
    pub model: String,
}

/// OpenRouter base URL.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// OpenAI base URL, used when nothing else is configured.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenRouter default configuration.
pub fn openrouter_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openrouter".into(),
        base_url: OPENROUTER_BASE_URL.into(),
        api_key,
        model: model.into(),
    }
}

/// Base URL for a provider name when none is configured.
pub fn default_base_url(provider_name: &str) -> &'static str {
    match provider_name {
        "openrouter" => OPENROUTER_BASE_URL,
        "deepseek" => "https://api.deepseek.com/v1",
        _ => OPENAI_BASE_URL,
    }
}
