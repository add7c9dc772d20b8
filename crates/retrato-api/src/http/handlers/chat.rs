//! Interview handlers: `POST /api/chat` and `POST /api/start`.
//!
//! Field names on the wire are camelCase. Client-held history may arrive as
//! `{role, text}` or in Gemini's `{role, parts: [{text}]}` shape.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use retrato_types::interview::{ChatRequest, PortraitRecord};
use retrato_types::llm::{MessageRole, ProviderSlot, Turn};

use crate::http::error::{AppError, CHAT_FAILED, START_FAILED};
use crate::state::{AppState, ConcreteInterviewService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Option<Vec<WireTurn>>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A history entry as sent by browser clients.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireTurn {
    Text { role: String, text: String },
    Parts { role: String, parts: Vec<WirePart> },
}

#[derive(Debug, Deserialize)]
pub struct WirePart {
    #[serde(default)]
    pub text: String,
}

impl TryFrom<WireTurn> for Turn {
    type Error = String;

    fn try_from(wire: WireTurn) -> Result<Self, Self::Error> {
        let (role, text) = match wire {
            WireTurn::Text { role, text } => (role, text),
            WireTurn::Parts { role, parts } => {
                (role, parts.into_iter().map(|p| p.text).collect::<String>())
            }
        };
        Ok(Turn {
            role: role.parse::<MessageRole>()?,
            text,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub is_retrato: bool,
    pub retrato_data: Option<PortraitRecord>,
    pub session_id: String,
    pub model: ProviderSlot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub response: String,
    pub session_id: String,
    pub model: ProviderSlot,
}

/// POST /api/chat - One interview turn.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = body.message.unwrap_or_default();
    if message.trim().is_empty() {
        return Err(AppError::Validation("Message required".to_string()));
    }

    let history = body
        .history
        .map(|turns| {
            turns
                .into_iter()
                .map(Turn::try_from)
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()
        .map_err(AppError::Validation)?;

    let session_id = body
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(ConcreteInterviewService::new_session_id);

    let result = state
        .interview
        .chat(ChatRequest {
            session_id,
            message,
            history,
        })
        .await
        .map_err(|e| AppError::interview(CHAT_FAILED, e))?;

    Ok(Json(ChatResponse {
        response: result.text,
        is_retrato: result.extracted.is_some(),
        retrato_data: result.extracted,
        session_id: result.session_id,
        model: result.provider_used,
    }))
}

/// POST /api/start - Open a session with the interviewer's greeting.
pub async fn start(State(state): State<AppState>) -> Result<Json<StartResponse>, AppError> {
    let result = state
        .interview
        .start()
        .await
        .map_err(|e| AppError::interview(START_FAILED, e))?;

    Ok(Json(StartResponse {
        response: result.text,
        session_id: result.session_id,
        model: result.provider_used,
    }))
}
