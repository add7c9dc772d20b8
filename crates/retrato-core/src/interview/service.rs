//! Interview service: one conversational turn, end to end.
//!
//! `InterviewService` owns the provider coordinator, the session store, and
//! the conversation sink. For each inbound message it picks the base history,
//! asks the coordinator for a reply, commits the exchange, queues it for the
//! sink, and looks for a portrait in the reply. Sink writes run on a
//! background writer and never hold the session lock.

use uuid::Uuid;

use retrato_types::error::InterviewError;
use retrato_types::interview::{ChatRequest, CompletionResult, StartResult};
use retrato_types::llm::Turn;

use crate::llm::fallback::FallbackCoordinator;
use crate::repository::{ConversationSink, SinkMirror};

use super::extractor::PortraitExtractor;
use super::session::SessionStore;

/// Fixed text that frames every interview.
#[derive(Debug, Clone)]
pub struct InterviewScript {
    pub system_prompt: String,
    /// Sent to the model to open a session.
    pub opening_instruction: String,
    /// User turn recorded in history for the opening exchange.
    pub opening_record: String,
}

/// Orchestrates interview turns across providers, history, and persistence.
pub struct InterviewService<S> {
    coordinator: FallbackCoordinator,
    sessions: S,
    mirror: SinkMirror,
    script: InterviewScript,
}

impl<S: SessionStore> InterviewService<S> {
    /// Spawns the sink writer, so this must run inside a Tokio runtime.
    pub fn new<C: ConversationSink + 'static>(
        coordinator: FallbackCoordinator,
        sessions: S,
        sink: C,
        script: InterviewScript,
    ) -> Self {
        Self {
            coordinator,
            sessions,
            mirror: SinkMirror::spawn(sink),
            script,
        }
    }

    pub fn coordinator(&self) -> &FallbackCoordinator {
        &self.coordinator
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Wait for queued sink writes to finish.
    pub async fn flush_persistence(&self) {
        self.mirror.flush().await;
    }

    /// Fresh opaque session id, e.g. `session_0192f0c4...`.
    pub fn new_session_id() -> String {
        format!("session_{}", Uuid::now_v7().simple())
    }

    /// Open a new session with the assistant's greeting.
    #[tracing::instrument(name = "interview_start", skip(self))]
    pub async fn start(&self) -> Result<StartResult, InterviewError> {
        let session_id = Self::new_session_id();
        let _guard = self.sessions.lock(&session_id).await;

        let result = self
            .coordinator
            .complete(
                &self.script.system_prompt,
                &[],
                &self.script.opening_instruction,
            )
            .await?;

        let text = result.response.content;
        let exchange = [
            Turn::user(self.script.opening_record.as_str()),
            Turn::assistant(text.as_str()),
        ];
        self.sessions.overwrite(&session_id, exchange.to_vec()).await;
        self.mirror.turns(&session_id, &exchange);

        tracing::info!(
            session_id = %session_id,
            provider = %result.provider_name,
            "Interview session started"
        );

        Ok(StartResult {
            session_id,
            text,
            provider_used: result.provider_used,
        })
    }

    /// Produce the assistant's reply to one user message and commit it.
    ///
    /// A caller-supplied history (even an empty one) is authoritative for
    /// this call and replaces the stored history on commit. Without it, the
    /// stored history is used and the exchange is appended. Nothing is
    /// written when the coordinator fails.
    #[tracing::instrument(
        name = "interview_chat",
        skip(self, request),
        fields(
            session_id = %request.session_id,
            caller_history = request.history.is_some(),
        )
    )]
    pub async fn chat(&self, request: ChatRequest) -> Result<CompletionResult, InterviewError> {
        if request.message.trim().is_empty() {
            return Err(InterviewError::InvalidInput("Message required".to_string()));
        }
        if request.session_id.trim().is_empty() {
            return Err(InterviewError::InvalidInput(
                "Session id required".to_string(),
            ));
        }

        let ChatRequest {
            session_id,
            message,
            history,
        } = request;

        let _guard = self.sessions.lock(&session_id).await;

        let caller_history = history.is_some();
        let base = match history {
            Some(turns) => turns,
            None => self.sessions.get(&session_id).await,
        };

        let result = self
            .coordinator
            .complete(&self.script.system_prompt, &base, &message)
            .await?;

        let text = result.response.content;
        let exchange = [Turn::user(message), Turn::assistant(text.as_str())];

        if caller_history {
            let mut turns = base;
            turns.extend(exchange.iter().cloned());
            self.sessions.overwrite(&session_id, turns).await;
        } else {
            self.sessions.append(&session_id, exchange.clone()).await;
        }
        self.mirror.turns(&session_id, &exchange);

        let extracted = PortraitExtractor::extract(&text);
        if let Some(record) = &extracted {
            tracing::info!(session_id = %session_id, "Interview portrait extracted");
            if record.is_blank() {
                tracing::warn!(session_id = %session_id, "Portrait has no data, lead not stored");
            } else {
                self.mirror.lead(&session_id, record);
            }
        }

        tracing::debug!(
            provider = %result.provider_name,
            reply_len = text.len(),
            "Interview turn committed"
        );

        Ok(CompletionResult {
            session_id,
            text,
            provider_used: result.provider_used,
            extracted,
        })
    }
}
