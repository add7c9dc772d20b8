//! Conversation sink trait definition.
//!
//! Mirrors committed turns and extracted portraits to durable storage. The
//! sink is write-only: the in-process session store stays the source of
//! truth for history, and sink failures never fail a request.

use retrato_types::error::RepositoryError;
use retrato_types::interview::PortraitRecord;
use retrato_types::llm::Turn;

/// Write-only persistence for interview transcripts and leads.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ConversationSink: Send + Sync {
    /// Append committed turns for a session, in order.
    fn append_turns(
        &self,
        session_id: &str,
        turns: &[Turn],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Store a completed interview portrait as a lead.
    fn store_lead(
        &self,
        record: &PortraitRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

/// Sink used when no durable storage is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSink;

impl ConversationSink for DisabledSink {
    async fn append_turns(&self, session_id: &str, turns: &[Turn]) -> Result<(), RepositoryError> {
        tracing::trace!(session_id, count = turns.len(), "Persistence disabled, dropping turns");
        Ok(())
    }

    async fn store_lead(&self, _record: &PortraitRecord) -> Result<(), RepositoryError> {
        tracing::trace!("Persistence disabled, dropping lead");
        Ok(())
    }
}
