//! Configuration types for Retrato.
//!
//! `RetratoConfig` represents the top-level `retrato.toml`. Every section and
//! field has a default, so an empty (or missing) file yields a working setup
//! that talks to OpenRouter first and Gemini second.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetratoConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "ProviderConfig::primary_default")]
    pub primary: ProviderConfig,
    #[serde(default = "ProviderConfig::secondary_default")]
    pub secondary: ProviderConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub interview: InterviewConfig,
}

/// HTTP listener and static-file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for non-API paths; skipped when it does not exist.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// File under `static_dir` served at `/`.
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_index_file() -> String {
    "samantha-chat.html".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            index_file: default_index_file(),
        }
    }
}

/// Backend protocol spoken by a provider slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
    Gemini,
}

/// Configuration for one provider slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub kind: ProviderKind,
    /// Human-readable name used in logs (e.g., "openrouter", "gemini").
    pub name: String,
    /// Override the default base URL for the provider.
    #[serde(default)]
    pub base_url: Option<String>,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Upper bound for a single provider call (one attempt).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    120
}

impl ProviderConfig {
    /// OpenRouter-hosted DeepSeek, retried linearly on rate limits.
    pub fn primary_default() -> Self {
        Self {
            enabled: true,
            kind: ProviderKind::OpenAiCompatible,
            name: "openrouter".to_string(),
            base_url: Some("https://openrouter.ai/api/v1".to_string()),
            model: "deepseek/deepseek-chat".to_string(),
            api_key_env: "DEEPSEEK_API_KEY".to_string(),
            max_tokens: Some(1500),
            timeout_secs: default_timeout_secs(),
            retry: RetryPolicy {
                max_retries: 3,
                backoff: BackoffStrategy::Linear { step_ms: 2_000 },
            },
        }
    }

    /// Gemini Flash, retried with capped exponential backoff.
    pub fn secondary_default() -> Self {
        Self {
            enabled: true,
            kind: ProviderKind::Gemini,
            name: "gemini".to_string(),
            base_url: None,
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Bounded retry on rate-limit signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total calls are at most `max_retries + 1`.
    pub max_retries: u32,
    #[serde(flatten)]
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff: BackoffStrategy::Exponential {
                base_ms: 5_000,
                cap_ms: 65_000,
                max_jitter_ms: 1_000,
            },
        }
    }
}

/// How long to wait before retry number `attempt` (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// `min(2^attempt * base + jitter, cap)` with jitter uniform in `[0, max_jitter)`.
    Exponential {
        base_ms: u64,
        cap_ms: u64,
        max_jitter_ms: u64,
    },
    /// `step * attempt`.
    Linear { step_ms: u64 },
}

/// In-process session map bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sessions untouched for longer than this are evicted.
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_idle_ttl_secs() -> u64 {
    6 * 60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    5 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Supabase (PostgREST) persistence settings. Disabled when either env var is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_url_env")]
    pub url_env: String,
    #[serde(default = "default_key_env")]
    pub key_env: String,
    #[serde(default = "default_conversations_table")]
    pub conversations_table: String,
    #[serde(default = "default_leads_table")]
    pub leads_table: String,
}

fn default_url_env() -> String {
    "SUPABASE_URL".to_string()
}

fn default_key_env() -> String {
    "SUPABASE_ANON_KEY".to_string()
}

fn default_conversations_table() -> String {
    "samantha_conversations".to_string()
}

fn default_leads_table() -> String {
    "samantha_leads".to_string()
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            url_env: default_url_env(),
            key_env: default_key_env(),
            conversations_table: default_conversations_table(),
            leads_table: default_leads_table(),
        }
    }
}

/// Interview script settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewConfig {
    /// Replaces the bundled system prompt when set.
    #[serde(default)]
    pub system_prompt_file: Option<PathBuf>,
    /// Instruction sent to the model to open a session.
    #[serde(default = "default_opening_instruction")]
    pub opening_instruction: String,
    /// User turn recorded in the session history for the opening exchange.
    #[serde(default = "default_opening_record")]
    pub opening_record: String,
}

fn default_opening_instruction() -> String {
    "Inicie a conversa se apresentando brevemente e pergunte o nome da pessoa.".to_string()
}

fn default_opening_record() -> String {
    "Inicie a conversa se apresentando".to_string()
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            system_prompt_file: None,
            opening_instruction: default_opening_instruction(),
            opening_record: default_opening_record(),
        }
    }
}

impl Default for RetratoConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            primary: ProviderConfig::primary_default(),
            secondary: ProviderConfig::secondary_default(),
            sessions: SessionConfig::default(),
            persistence: PersistenceConfig::default(),
            interview: InterviewConfig::default(),
        }
    }
}
