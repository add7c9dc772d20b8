//! LlmProvider trait definition.
//!
//! This is the core abstraction that both provider backends implement.
//! Uses RPITIT for `complete`; `BoxLlmProvider` adds dynamic dispatch.

use retrato_types::llm::{CompletionRequest, CompletionResponse, LlmError, RoleVocabulary};

/// Trait for LLM provider backends (OpenAI-compatible, Gemini).
///
/// Providers have no server-side conversation: every call carries the full,
/// already-normalized history in `request.messages`.
///
/// Implementations live in retrato-infra (e.g., `GeminiProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openrouter", "gemini").
    fn name(&self) -> &str;

    /// Role labels this provider expects in `request.messages`.
    fn vocabulary(&self) -> RoleVocabulary;

    /// Send a completion request and receive the full response.
    ///
    /// Rate-limit and quota signals must surface as [`LlmError::RateLimited`]
    /// so the retry engine can tell them apart from fatal failures.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
