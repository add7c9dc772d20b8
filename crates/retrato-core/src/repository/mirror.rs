//! Background writer that mirrors committed turns and leads to a sink.
//!
//! Writes are queued on a bounded channel and drained by one task, so a slow
//! sink never holds a session lock and rows for a session land in commit
//! order. A full queue drops the write with a warning.

use tokio::sync::{mpsc, oneshot};

use retrato_types::interview::PortraitRecord;
use retrato_types::llm::Turn;

use super::ConversationSink;

/// Pending writes allowed before new ones are dropped.
const MIRROR_BUFFER: usize = 1024;

enum MirrorJob {
    Turns {
        session_id: String,
        turns: Vec<Turn>,
    },
    Lead {
        session_id: String,
        record: PortraitRecord,
    },
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task. Dropping every handle stops the task once the
/// queue is drained.
pub struct SinkMirror {
    jobs: mpsc::Sender<MirrorJob>,
}

impl SinkMirror {
    /// Move `sink` into a new writer task. Must be called inside a Tokio runtime.
    pub fn spawn<C>(sink: C) -> Self
    where
        C: ConversationSink + 'static,
    {
        let (jobs, rx) = mpsc::channel(MIRROR_BUFFER);
        tokio::spawn(drain(sink, rx));
        Self { jobs }
    }

    /// Queue committed turns for a session.
    pub fn turns(&self, session_id: &str, turns: &[Turn]) {
        self.enqueue(MirrorJob::Turns {
            session_id: session_id.to_string(),
            turns: turns.to_vec(),
        });
    }

    /// Queue an extracted portrait.
    pub fn lead(&self, session_id: &str, record: &PortraitRecord) {
        self.enqueue(MirrorJob::Lead {
            session_id: session_id.to_string(),
            record: record.clone(),
        });
    }

    /// Wait until every write queued before this call has been attempted.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.jobs.send(MirrorJob::Flush(done)).await.is_ok() {
            let _ = wait.await;
        }
    }

    fn enqueue(&self, job: MirrorJob) {
        if let Err(e) = self.jobs.try_send(job) {
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "writer stopped",
            };
            tracing::warn!(reason, "Dropping persistence write");
        }
    }
}

async fn drain<C: ConversationSink>(sink: C, mut rx: mpsc::Receiver<MirrorJob>) {
    while let Some(job) = rx.recv().await {
        match job {
            MirrorJob::Turns { session_id, turns } => {
                if let Err(e) = sink.append_turns(&session_id, &turns).await {
                    tracing::warn!(session_id, error = %e, "Failed to persist conversation turns");
                }
            }
            MirrorJob::Lead { session_id, record } => {
                if let Err(e) = sink.store_lead(&record).await {
                    tracing::warn!(session_id, error = %e, "Failed to persist lead");
                }
            }
            MirrorJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::debug!("Persistence writer stopped");
}
