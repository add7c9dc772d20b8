//! Scripted providers and sinks shared by the unit tests in this crate.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;

use retrato_types::error::RepositoryError;
use retrato_types::interview::PortraitRecord;
use retrato_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderMessage, RoleVocabulary, Turn,
};

use crate::llm::provider::LlmProvider;
use crate::repository::ConversationSink;

/// One scripted provider outcome.
#[derive(Clone)]
pub(crate) enum Reply {
    Text(String),
    /// Reply "<name>: <last message>" so tests can see which provider ran.
    Echo,
    RateLimited,
    Fail,
    /// Never resolves; exercises the per-call timeout.
    Hang,
    /// Sleep before echoing, so concurrent calls interleave.
    SlowEcho(Duration),
}

/// Provider that plays back a script; the last reply repeats forever.
pub(crate) struct ScriptedProvider {
    name: String,
    vocabulary: RoleVocabulary,
    script: Mutex<VecDeque<Reply>>,
    calls: Arc<AtomicU32>,
    requests: Arc<Mutex<Vec<Vec<ProviderMessage>>>>,
}

impl ScriptedProvider {
    pub(crate) fn new(name: &str, replies: Vec<Reply>) -> Self {
        Self {
            name: name.to_string(),
            vocabulary: RoleVocabulary::OPENAI,
            script: Mutex::new(replies.into()),
            calls: Arc::new(AtomicU32::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn with_vocabulary(mut self, vocabulary: RoleVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub(crate) fn calls(&self) -> Arc<AtomicU32> {
        self.calls.clone()
    }

    pub(crate) fn requests(&self) -> Arc<Mutex<Vec<Vec<ProviderMessage>>>> {
        self.requests.clone()
    }

    fn next_reply(&self) -> Reply {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap_or(Reply::Echo)
        }
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn vocabulary(&self) -> RoleVocabulary {
        self.vocabulary
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.messages.clone());
        let reply = self.next_reply();
        let name = self.name.clone();
        let last = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        async move {
            let content = match reply {
                Reply::Text(text) => text,
                Reply::Echo => format!("{name}: {last}"),
                Reply::RateLimited => {
                    return Err(LlmError::RateLimited {
                        message: "429 Quota exceeded".to_string(),
                    });
                }
                Reply::Fail => {
                    return Err(LlmError::Provider {
                        message: format!("{name} is down"),
                    });
                }
                Reply::Hang => std::future::pending().await,
                Reply::SlowEcho(delay) => {
                    tokio::time::sleep(delay).await;
                    format!("{name}: {last}")
                }
            };
            Ok(CompletionResponse {
                content,
                model: format!("{name}-model"),
            })
        }
    }
}

/// Sink that records every write, optionally failing all of them.
#[derive(Default, Clone)]
pub(crate) struct RecordingSink {
    pub(crate) turns: Arc<Mutex<Vec<(String, Turn)>>>,
    pub(crate) leads: Arc<Mutex<Vec<PortraitRecord>>>,
    pub(crate) fail: bool,
    /// When set, each turn write waits for a permit.
    gate: Option<Arc<Semaphore>>,
}

impl RecordingSink {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub(crate) fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }
}

impl ConversationSink for RecordingSink {
    async fn append_turns(&self, session_id: &str, turns: &[Turn]) -> Result<(), RepositoryError> {
        if self.fail {
            return Err(RepositoryError::Connection("sink offline".to_string()));
        }
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        let mut recorded = self.turns.lock().unwrap();
        recorded.extend(turns.iter().map(|t| (session_id.to_string(), t.clone())));
        Ok(())
    }

    async fn store_lead(&self, record: &PortraitRecord) -> Result<(), RepositoryError> {
        if self.fail {
            return Err(RepositoryError::Connection("sink offline".to_string()));
        }
        self.leads.lock().unwrap().push(record.clone());
        Ok(())
    }
}
