//! Supabase (PostgREST) conversation sink.
//!
//! Rows are inserted with `POST {url}/rest/v1/{table}`:
//! - conversations: `{session_id, role, content}`, one row per turn
//! - leads: `{nome, email, profissao, retrato_json}`
//!
//! The anon key is sent as both `apikey` and bearer token, as PostgREST
//! behind Supabase expects.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::json;

use retrato_core::interview::extractor::PORTRAIT_KIND;
use retrato_core::repository::ConversationSink;
use retrato_types::error::RepositoryError;
use retrato_types::interview::PortraitRecord;
use retrato_types::llm::{MessageRole, Turn};

/// One row of the conversations table.
#[derive(Debug, Serialize)]
struct ConversationRow<'a> {
    session_id: &'a str,
    role: &'static str,
    content: &'a str,
}

/// One row of the leads table.
#[derive(Debug, Serialize)]
struct LeadRow<'a> {
    nome: &'a str,
    email: &'a str,
    profissao: &'a str,
    retrato_json: serde_json::Value,
}

/// Write-only sink backed by Supabase's REST interface.
pub struct SupabaseSink {
    client: reqwest::Client,
    rest_url: String,
    api_key: SecretString,
    conversations_table: String,
    leads_table: String,
}

impl SupabaseSink {
    pub fn new(
        project_url: &str,
        api_key: SecretString,
        conversations_table: String,
        leads_table: String,
    ) -> Result<Self, RepositoryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| RepositoryError::Connection(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key,
            conversations_table,
            leads_table,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{table}", self.rest_url)
    }

    async fn insert<T: Serialize + ?Sized>(&self, table: &str, rows: &T) -> Result<(), RepositoryError> {
        let key = self.api_key.expose_secret();
        let response = self
            .client
            .post(self.table_url(table))
            .header("apikey", key)
            .bearer_auth(key)
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await
            .map_err(|e| RepositoryError::Connection(format!("insert into {table} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RepositoryError::Query(format!(
                "insert into {table} returned HTTP {status}: {body}"
            )));
        }
        Ok(())
    }
}

fn conversation_rows<'a>(session_id: &'a str, turns: &'a [Turn]) -> Vec<ConversationRow<'a>> {
    turns
        .iter()
        .map(|turn| ConversationRow {
            session_id,
            role: match turn.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            },
            content: &turn.text,
        })
        .collect()
}

fn lead_row(record: &PortraitRecord) -> LeadRow<'_> {
    LeadRow {
        nome: &record.name,
        email: &record.email,
        profissao: &record.profession,
        retrato_json: json!({ "tipo": PORTRAIT_KIND, "dados": record }),
    }
}

impl ConversationSink for SupabaseSink {
    async fn append_turns(&self, session_id: &str, turns: &[Turn]) -> Result<(), RepositoryError> {
        if turns.is_empty() {
            return Ok(());
        }
        let rows = conversation_rows(session_id, turns);
        self.insert(&self.conversations_table, &rows).await
    }

    async fn store_lead(&self, record: &PortraitRecord) -> Result<(), RepositoryError> {
        self.insert(&self.leads_table, &lead_row(record)).await?;
        tracing::info!("Lead stored");
        Ok(())
    }
}
