//! Structured payload extraction from assistant replies.
//!
//! When the interview concludes, the model embeds a fenced JSON block
//! (```` ```json ... ``` ````) holding `{"tipo": "retrato", "dados": {...}}`.
//! Only the first fenced block is considered. A block that does not parse, or
//! is not tagged as a portrait, yields `None`; extraction never fails the
//! request. A tagged block always counts as a portrait, even when `dados` is
//! missing or sloppy.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use retrato_types::interview::PortraitRecord;

/// Discriminator value marking a portrait payload.
pub const PORTRAIT_KIND: &str = "retrato";

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("fenced JSON pattern is valid")
});

/// Stateless extractor for portrait payloads.
pub struct PortraitExtractor;

impl PortraitExtractor {
    /// Body of the first ```` ```json ```` fence, trimmed.
    pub fn first_fenced_block(text: &str) -> Option<&str> {
        FENCED_JSON
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Parse a portrait out of `text`, if it carries one.
    pub fn extract(text: &str) -> Option<PortraitRecord> {
        let block = Self::first_fenced_block(text)?;

        let payload: Value = match serde_json::from_str(block) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "Fenced JSON block did not parse");
                return None;
            }
        };

        if payload.get("tipo").and_then(Value::as_str) != Some(PORTRAIT_KIND) {
            return None;
        }

        let record = match payload.get("dados") {
            Some(data @ Value::Object(_)) => {
                serde_json::from_value::<PortraitRecord>(data.clone()).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Portrait payload has unexpected shape");
                    PortraitRecord::default()
                })
            }
            _ => {
                tracing::warn!("Portrait payload has no 'dados' object");
                PortraitRecord::default()
            }
        };
        Some(record)
    }
}
