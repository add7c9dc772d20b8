//! Session history store.
//!
//! Maps a session id to its ordered list of committed turns. Writes only
//! happen after a successful completion, one user+assistant pair at a time,
//! so a stored history never holds a dangling user turn.
//!
//! Callers serialize work per session with [`SessionStore::lock`]; distinct
//! sessions never contend.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;

use retrato_types::llm::Turn;

/// Exclusive hold on one session id. Released on drop.
pub type SessionGuard = OwnedMutexGuard<()>;

/// Storage for per-session conversation history.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait SessionStore: Send + Sync {
    /// Wait for exclusive access to `session_id`.
    fn lock(&self, session_id: &str) -> impl std::future::Future<Output = SessionGuard> + Send;

    /// Stored history, empty for unknown ids.
    fn get(&self, session_id: &str) -> impl std::future::Future<Output = Vec<Turn>> + Send;

    /// Append one committed user+assistant exchange.
    fn append(
        &self,
        session_id: &str,
        exchange: [Turn; 2],
    ) -> impl std::future::Future<Output = ()> + Send;

    /// Replace the stored history wholesale.
    fn overwrite(
        &self,
        session_id: &str,
        turns: Vec<Turn>,
    ) -> impl std::future::Future<Output = ()> + Send;
}

struct SessionEntry {
    turns: Vec<Turn>,
    last_touched: Instant,
}

/// Process-local session store backed by `DashMap`.
///
/// Guards are never held across await points; the per-session mutex is
/// cloned out of the lock map before it is awaited.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionEntry>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions not touched within `max_idle`. Returns how many went.
    ///
    /// Lock entries are dropped alongside, unless someone currently holds or
    /// waits on them.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.last_touched.elapsed() < max_idle);
        let evicted = before.saturating_sub(self.sessions.len());

        self.locks.retain(|id, lock| {
            Arc::strong_count(lock) > 1 || self.sessions.contains_key(id)
        });

        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.sessions.len(), "Evicted idle sessions");
        }
        evicted
    }
}

impl SessionStore for InMemorySessionStore {
    async fn lock(&self, session_id: &str) -> SessionGuard {
        let mutex = self
            .locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    async fn get(&self, session_id: &str) -> Vec<Turn> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.turns.clone())
            .unwrap_or_default()
    }

    async fn append(&self, session_id: &str, exchange: [Turn; 2]) {
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                turns: Vec::new(),
                last_touched: Instant::now(),
            });
        entry.turns.extend(exchange);
        entry.last_touched = Instant::now();
    }

    async fn overwrite(&self, session_id: &str, turns: Vec<Turn>) {
        self.sessions.insert(
            session_id.to_string(),
            SessionEntry {
                turns,
                last_touched: Instant::now(),
            },
        );
    }
}
