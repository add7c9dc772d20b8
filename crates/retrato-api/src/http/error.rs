//! Application error type mapping to HTTP status codes.
//!
//! Validation failures answer 400 `{error}`. Provider failures answer 500
//! `{error, details, hint}`, where `error` names the operation that failed.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use retrato_types::error::InterviewError;
use retrato_types::llm::LlmError;

/// Failure of `POST /api/chat`.
pub const CHAT_FAILED: &str = "Erro no processamento";
/// Failure of `POST /api/start`.
pub const START_FAILED: &str = "Falha ao iniciar chat";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or incomplete request.
    Validation(String),
    /// No provider produced a reply.
    Provider {
        context: &'static str,
        source: LlmError,
    },
}

impl AppError {
    /// Attach the operation name to an interview failure.
    pub fn interview(context: &'static str, err: InterviewError) -> Self {
        match err {
            InterviewError::InvalidInput(msg) => AppError::Validation(msg),
            InterviewError::Provider(source) => AppError::Provider { context, source },
        }
    }
}

/// Operator-facing hint for a provider failure.
fn hint(err: &LlmError) -> &'static str {
    match err {
        LlmError::AuthenticationFailed => {
            "Verifique as chaves DEEPSEEK_API_KEY e GEMINI_API_KEY."
        }
        LlmError::RateLimited { .. } => {
            "Cota dos provedores esgotada. Verifique os créditos no OpenRouter ou tente mais tarde."
        }
        LlmError::NoProviderAvailable | LlmError::NotConfigured(_) => {
            "Nenhum provedor configurado. Defina DEEPSEEK_API_KEY ou GEMINI_API_KEY."
        }
        LlmError::Timeout { .. } => "O provedor demorou demais para responder. Tente novamente.",
        _ => "Verifique a chave DEEPSEEK_API_KEY ou créditos no OpenRouter.",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Provider { context, source } => {
                tracing::error!(error = %source, "{context}");
                let body = json!({
                    "error": context,
                    "details": source.to_string(),
                    "hint": hint(&source),
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
