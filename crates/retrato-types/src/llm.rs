//! LLM request/response types for Retrato.
//!
//! These types model the data shapes for provider interactions: the canonical
//! conversation [`Turn`], the provider-labelled [`ProviderMessage`], completion
//! requests/responses, and the error taxonomy shared by every provider.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Author of a conversation turn, in the canonical vocabulary.
///
/// Providers use their own labels for these roles; see
/// [`RoleVocabulary`] for the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            // Gemini labels model-authored turns "model"; accept it on input.
            "assistant" | "model" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// One message in a conversation, attributed to the user or the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            text: text.into(),
        }
    }
}

/// Role labels a provider expects for user- and model-authored messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleVocabulary {
    pub user: &'static str,
    pub assistant: &'static str,
}

impl RoleVocabulary {
    /// OpenAI chat-completions labels.
    pub const OPENAI: RoleVocabulary = RoleVocabulary {
        user: "user",
        assistant: "assistant",
    };

    /// Gemini `generateContent` labels.
    pub const GEMINI: RoleVocabulary = RoleVocabulary {
        user: "user",
        assistant: "model",
    };

    /// The label for a canonical role.
    pub fn label(&self, role: MessageRole) -> &'static str {
        match role {
            MessageRole::User => self.user,
            MessageRole::Assistant => self.assistant,
        }
    }
}

/// A message already translated into a provider's role vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: String,
    pub content: String,
}

/// Request to an LLM provider for a completion.
///
/// `messages` holds the full history plus the new user message; providers
/// have no server-side session, so everything is sent on each call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Empty means "use the provider's configured model".
    pub model: String,
    pub messages: Vec<ProviderMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Response from an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
}

/// Which configured provider handled a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSlot {
    Primary,
    Secondary,
}

impl fmt::Display for ProviderSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderSlot::Primary => write!(f, "primary"),
            ProviderSlot::Secondary => write!(f, "secondary"),
        }
    }
}

/// Errors from LLM provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited: {message}")]
    RateLimited { message: String },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("provider call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("no provider available to handle the request")]
    NoProviderAvailable,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// Whether the error is a rate-limit / quota signal worth retrying.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }
}

/// Capability state of one provider slot (for `/health` and the CLI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStatusInfo {
    pub slot: ProviderSlot,
    pub name: String,
    pub enabled: bool,
}
