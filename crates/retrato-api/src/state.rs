//! Application state wiring the interview service together.
//!
//! `InterviewService` is generic over its session store; AppState pins it to
//! the in-memory store and hands it the sink chosen from configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinHandle;

use retrato_core::interview::service::InterviewService;
use retrato_core::interview::session::InMemorySessionStore;
use retrato_infra::llm::build_coordinator;
use retrato_infra::persistence::ConfiguredSink;
use retrato_infra::prompt::load_interview_script;
use retrato_types::config::{RetratoConfig, SessionConfig};

pub type ConcreteInterviewService = InterviewService<InMemorySessionStore>;

/// Shared state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub interview: Arc<ConcreteInterviewService>,
    pub persistence_enabled: bool,
    pub static_dir: PathBuf,
    pub index_file: String,
}

impl AppState {
    /// Build providers, the sink, and the interview script from config.
    pub async fn init(config: &RetratoConfig) -> anyhow::Result<Self> {
        let coordinator =
            build_coordinator(config).context("failed to configure LLM providers")?;
        let sink = ConfiguredSink::from_config(&config.persistence)
            .context("failed to configure persistence")?;
        let script = load_interview_script(&config.interview).await?;

        let persistence_enabled = sink.is_enabled();
        let service =
            InterviewService::new(coordinator, InMemorySessionStore::new(), sink, script);

        Ok(Self::new(service, persistence_enabled, config))
    }

    pub fn new(
        service: ConcreteInterviewService,
        persistence_enabled: bool,
        config: &RetratoConfig,
    ) -> Self {
        Self {
            interview: Arc::new(service),
            persistence_enabled,
            static_dir: config.server.static_dir.clone(),
            index_file: config.server.index_file.clone(),
        }
    }
}

/// Periodically drop sessions idle for longer than `idle_ttl_secs`.
pub fn spawn_session_sweeper(
    service: Arc<ConcreteInterviewService>,
    config: &SessionConfig,
) -> JoinHandle<()> {
    let max_idle = Duration::from_secs(config.idle_ttl_secs);
    let period = Duration::from_secs(config.sweep_interval_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = service.sessions().evict_idle(max_idle);
            if evicted > 0 {
                tracing::info!(
                    evicted,
                    remaining = service.sessions().len(),
                    "Evicted idle sessions"
                );
            }
        }
    })
}
