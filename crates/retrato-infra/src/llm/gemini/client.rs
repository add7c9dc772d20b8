//! GeminiProvider -- concrete [`LlmProvider`] implementation for Google Gemini.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the `x-goog-api-key` header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use retrato_core::llm::provider::LlmProvider;
use retrato_types::llm::{CompletionRequest, CompletionResponse, LlmError, RoleVocabulary};

use super::types::{
    GeminiContent, GeminiErrorEnvelope, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig,
};

/// Default Gemini REST base URL.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini LLM provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    provider_name: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(
        provider_name: String,
        api_key: SecretString,
        model: String,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            provider_name,
            model,
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    /// Convert a generic [`CompletionRequest`] into a [`GenerateContentRequest`].
    ///
    /// `request.messages` is already labelled with the Gemini vocabulary.
    fn to_gemini_request(request: &CompletionRequest) -> GenerateContentRequest {
        let contents = request
            .messages
            .iter()
            .map(|m| GeminiContent::text(Some(m.role.as_str()), &m.content))
            .collect();

        let generation_config = if request.max_tokens.is_some() || request.temperature.is_some() {
            Some(GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            })
        } else {
            None
        };

        GenerateContentRequest {
            contents,
            system_instruction: request
                .system
                .as_deref()
                .map(|s| GeminiContent::text(None, s)),
            generation_config,
        }
    }
}

// GeminiProvider intentionally does NOT derive Debug; the SecretString
// already redacts, but the whole struct stays out of Debug output.

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn vocabulary(&self) -> RoleVocabulary {
        RoleVocabulary::GEMINI
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };
        let body = Self::to_gemini_request(request);

        let response = self
            .client
            .post(self.url(model))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &error_body));
        }

        let gemini_resp: GenerateContentResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        let content = response_text(&gemini_resp)?;

        Ok(CompletionResponse {
            content,
            model: gemini_resp
                .model_version
                .unwrap_or_else(|| model.to_string()),
        })
    }
}

/// Concatenated text of the first candidate.
fn response_text(resp: &GenerateContentResponse) -> Result<String, LlmError> {
    let text: String = resp
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    if !text.is_empty() {
        return Ok(text);
    }

    let reason = resp
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
        .or_else(|| resp.candidates.first().and_then(|c| c.finish_reason.clone()))
        .unwrap_or_else(|| "no candidates".to_string());
    Err(LlmError::Provider {
        message: format!("Gemini returned no text ({reason})"),
    })
}

/// Map a non-2xx Gemini response to an [`LlmError`].
///
/// Quota exhaustion shows up as HTTP 429, as a `RESOURCE_EXHAUSTED` status, or
/// only in the message text ("Quota exceeded"); all three are rate limits.
/// The envelope's own `code` counts the same as the transport status.
fn classify_error(status: u16, body: &str) -> LlmError {
    let (code, grpc_status, message) = match serde_json::from_str::<GeminiErrorEnvelope>(body) {
        Ok(envelope) => (
            envelope.error.code,
            envelope.error.status,
            envelope.error.message,
        ),
        Err(_) => (0, String::new(), body.to_string()),
    };
    let either = |expected: u16| status == expected || code == expected;

    if either(429)
        || grpc_status == "RESOURCE_EXHAUSTED"
        || message.contains("Quota exceeded")
        || message.contains("429")
    {
        return LlmError::RateLimited { message };
    }

    if either(401)
        || either(403)
        || grpc_status == "UNAUTHENTICATED"
        || grpc_status == "PERMISSION_DENIED"
        || message.contains("API key not valid")
    {
        return LlmError::AuthenticationFailed;
    }

    if status == 400 && grpc_status == "INVALID_ARGUMENT" {
        return LlmError::InvalidRequest(message);
    }

    LlmError::Provider {
        message: format!("HTTP {status}: {message}"),
    }
}
