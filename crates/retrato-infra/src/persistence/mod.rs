//! Conversation sink implementations.
//!
//! [`SupabaseSink`] writes through Supabase's PostgREST API. [`ConfiguredSink`]
//! picks between it and [`DisabledSink`] at startup so the service keeps a
//! single concrete sink type.

pub mod supabase;

use retrato_core::repository::{ConversationSink, DisabledSink};
use retrato_types::config::PersistenceConfig;
use retrato_types::error::RepositoryError;
use retrato_types::interview::PortraitRecord;
use retrato_types::llm::Turn;

use crate::secret::{env_secret, env_value};

pub use supabase::SupabaseSink;

/// The sink chosen from configuration.
pub enum ConfiguredSink {
    Supabase(SupabaseSink),
    Disabled(DisabledSink),
}

impl ConfiguredSink {
    /// Supabase when both the URL and key variables are set, otherwise disabled.
    pub fn from_config(config: &PersistenceConfig) -> Result<Self, RepositoryError> {
        match (env_value(&config.url_env), env_secret(&config.key_env)) {
            (Some(url), Some(key)) => {
                let sink = SupabaseSink::new(
                    &url,
                    key,
                    config.conversations_table.clone(),
                    config.leads_table.clone(),
                )?;
                tracing::info!(
                    conversations = %config.conversations_table,
                    leads = %config.leads_table,
                    "Supabase persistence enabled"
                );
                Ok(Self::Supabase(sink))
            }
            _ => {
                tracing::info!(
                    url_env = %config.url_env,
                    key_env = %config.key_env,
                    "Supabase credentials not set, persistence disabled"
                );
                Ok(Self::Disabled(DisabledSink))
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Supabase(_))
    }
}

impl ConversationSink for ConfiguredSink {
    async fn append_turns(&self, session_id: &str, turns: &[Turn]) -> Result<(), RepositoryError> {
        match self {
            Self::Supabase(sink) => sink.append_turns(session_id, turns).await,
            Self::Disabled(sink) => sink.append_turns(session_id, turns).await,
        }
    }

    async fn store_lead(&self, record: &PortraitRecord) -> Result<(), RepositoryError> {
        match self {
            Self::Supabase(sink) => sink.store_lead(record).await,
            Self::Disabled(sink) => sink.store_lead(record).await,
        }
    }
}
