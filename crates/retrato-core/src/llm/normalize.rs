//! Conversation history normalization.
//!
//! Callers hold history in the canonical [`Turn`] shape; each provider wants
//! its own role labels. Normalization only relabels -- order, length, and text
//! are carried over verbatim.

use retrato_types::llm::{ProviderMessage, RoleVocabulary, Turn};

/// Translate a canonical history into a provider's role vocabulary.
pub fn normalize(history: &[Turn], vocabulary: RoleVocabulary) -> Vec<ProviderMessage> {
    history
        .iter()
        .map(|turn| ProviderMessage {
            role: vocabulary.label(turn.role).to_string(),
            content: turn.text.clone(),
        })
        .collect()
}

/// Normalized history followed by the new user message.
pub fn build_messages(
    history: &[Turn],
    new_message: &str,
    vocabulary: RoleVocabulary,
) -> Vec<ProviderMessage> {
    let mut messages = normalize(history, vocabulary);
    messages.push(ProviderMessage {
        role: vocabulary.user.to_string(),
        content: new_message.to_string(),
    });
    messages
}
