//! Interview exchange types: what the HTTP layer hands the orchestrator and
//! what comes back, plus the portrait record extracted from the final turn.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::llm::{ProviderSlot, Turn};

/// One inbound user turn for a session.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    /// `None` means the session store is the source of truth; `Some` (even
    /// empty) is authoritative for this call.
    pub history: Option<Vec<Turn>>,
}

/// Outcome of a committed exchange.
#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub session_id: String,
    pub text: String,
    pub provider_used: ProviderSlot,
    pub extracted: Option<PortraitRecord>,
}

/// Outcome of opening a new interview session.
#[derive(Debug, Clone)]
pub struct StartResult {
    pub session_id: String,
    pub text: String,
    pub provider_used: ProviderSlot,
}

/// Structured workflow portrait produced when the interview concludes.
///
/// Field names on the wire follow the prompt's JSON contract. Deserialization
/// is lenient because the payload is written by a model: `null` reads as the
/// field's default, a bare string where a list is expected becomes a one-item
/// list, and keys outside the contract are kept in `extra` so the record
/// serializes back to everything the model sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortraitRecord {
    #[serde(rename = "nome", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(rename = "profissao", default, deserialize_with = "lenient_string")]
    pub profession: String,
    #[serde(rename = "resumo_trabalho", default, deserialize_with = "lenient_string")]
    pub work_summary: String,
    #[serde(rename = "fluxo_diario", default, deserialize_with = "lenient_string")]
    pub daily_flow: String,
    #[serde(rename = "gargalos", default, deserialize_with = "lenient_list")]
    pub bottlenecks: Vec<String>,
    #[serde(rename = "tarefas_repetitivas", default, deserialize_with = "lenient_list")]
    pub repetitive_tasks: Vec<String>,
    #[serde(rename = "oportunidades", default, deserialize_with = "lenient_list")]
    pub opportunities: Vec<String>,
    #[serde(
        rename = "horas_potenciais",
        default,
        deserialize_with = "lenient_hours",
        skip_serializing_if = "Option::is_none"
    )]
    pub hours_estimate: Option<HoursEstimate>,
    /// Keys the model added beyond the contract.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PortraitRecord {
    /// No contract field and no extra key carries anything.
    pub fn is_blank(&self) -> bool {
        self == &PortraitRecord::default()
    }
}

/// Hours that could be handed back per day. Models return either prose
/// ("3 a 4 horas") or a bare number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HoursEstimate {
    Hours(f64),
    Text(String),
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        other => scalar_text(other).into_iter().collect(),
    };
    Ok(items)
}

fn lenient_hours<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<HoursEstimate>, D::Error> {
    let hours = match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::Number(n) => n.as_f64().map(HoursEstimate::Hours),
        other => scalar_text(other).map(HoursEstimate::Text),
    };
    Ok(hours)
}
