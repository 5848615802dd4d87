//! Journal storage over Supabase's PostgREST interface.
//!
//! Requests authenticate with the service-role key both as `apikey` and as
//! a bearer token. Filters use PostgREST operators (`user_id=eq.<id>`).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::DatabaseError;
use crate::journal::{JournalEntry, JournalStore, NewJournalEntry};

pub const JOURNAL_TABLE: &str = "journal_entries";

pub struct SupabaseJournalStore {
    base_url: String,
    service_key: String,
    client: reqwest::Client,
}

/// PostgREST error body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PostgrestError {
    message: String,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

impl SupabaseJournalStore {
    pub fn new(base_url: &str, service_key: &str, timeout_secs: u64) -> Result<Self, DatabaseError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DatabaseError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            client,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{JOURNAL_TABLE}", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn transport_error(&self, e: reqwest::Error) -> DatabaseError {
        if e.is_connect() {
            DatabaseError::Connection(self.base_url.clone())
        } else {
            DatabaseError::HttpClient(e.to_string())
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, DatabaseError> {
        let response = self
            .authed(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_from_body(status.as_u16(), &body))
    }
}

fn error_from_body(status: u16, body: &str) -> DatabaseError {
    let message = match serde_json::from_str::<PostgrestError>(body) {
        Ok(err) if !err.message.is_empty() => {
            tracing::debug!(
                status,
                code = ?err.code,
                details = ?err.details,
                hint = ?err.hint,
                "PostgREST error"
            );
            err.message
        }
        _ if body.trim().is_empty() => format!("Supabase returned status {status}"),
        _ => body.trim().to_string(),
    };
    DatabaseError::Supabase { status, message }
}

#[async_trait]
impl JournalStore for SupabaseJournalStore {
    async fn insert(&self, entry: &NewJournalEntry) -> Result<JournalEntry, DatabaseError> {
        let response = self
            .send(
                self.client
                    .post(self.table_url())
                    .header("Prefer", "return=representation")
                    .json(&[entry]),
            )
            .await?;

        let rows: Vec<JournalEntry> = response
            .json()
            .await
            .map_err(|e| DatabaseError::ResponseParsing(e.to_string()))?;
        rows.into_iter().next().ok_or(DatabaseError::NoRowReturned)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<JournalEntry>, DatabaseError> {
        let response = self
            .send(self.client.get(self.table_url()).query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "date.desc".to_string()),
            ]))
            .await?;

        response
            .json()
            .await
            .map_err(|e| DatabaseError::ResponseParsing(e.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<(), DatabaseError> {
        self.send(
            self.client
                .delete(self.table_url())
                .query(&[("id", format!("eq.{id}"))]),
        )
        .await?;
        Ok(())
    }
}
