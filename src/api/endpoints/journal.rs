//! Symptom journal endpoints.
//!
//! - `POST /api/journal/add`: validate, normalize and store an entry
//! - `GET /api/journal/:user_id`: a user's entries, newest first
//! - `DELETE /api/journal/delete/:id`: delete one entry
//! - `GET /api/journal/:user_id/report`: mood and symptom summary
//! - `GET /api/journal/health`

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, DB_UNAVAILABLE};
use crate::api::types::{ApiContext, MessageResponse, SuccessResponse};
use crate::journal::{self, DateRange, JournalEntry, JournalEntryRequest, JournalReport, JournalStore};

fn store(ctx: &ApiContext) -> Result<&dyn JournalStore, ApiError> {
    ctx.core
        .journal()
        .ok_or_else(|| ApiError::ServiceUnavailable(DB_UNAVAILABLE.into()))
}

#[derive(Serialize)]
pub struct EntryResponse {
    pub success: bool,
    pub entry: JournalEntry,
}

/// `POST /api/journal/add`
pub async fn add(
    State(ctx): State<ApiContext>,
    payload: Result<Json<JournalEntryRequest>, JsonRejection>,
) -> Result<Json<EntryResponse>, ApiError> {
    let store = store(&ctx)?;
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let entry = request.normalize()?;

    let entry = store.insert(&entry).await?;
    tracing::info!(id = %entry.id, user_id = %entry.user_id, "Journal entry added");

    Ok(Json(EntryResponse {
        success: true,
        entry,
    }))
}

#[derive(Serialize)]
pub struct EntriesResponse {
    pub success: bool,
    pub entries: Vec<JournalEntry>,
}

/// `GET /api/journal/:user_id`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<String>,
) -> Result<Json<EntriesResponse>, ApiError> {
    let store = store(&ctx)?;
    let entries = store.list_for_user(&user_id).await?;
    tracing::debug!(%user_id, count = entries.len(), "Journal entries fetched");

    Ok(Json(EntriesResponse {
        success: true,
        entries,
    }))
}

/// `DELETE /api/journal/delete/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let store = store(&ctx)?;
    if id.trim().is_empty() {
        return Err(ApiError::BadRequest("Missing entry id".into()));
    }
    store.delete(&id).await?;
    tracing::info!(%id, "Journal entry deleted");
    Ok(Json(SuccessResponse::ok()))
}

#[derive(Deserialize)]
pub struct ReportQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Serialize)]
pub struct ReportResponse {
    pub success: bool,
    pub report: JournalReport,
}

/// `GET /api/journal/:user_id/report?from=YYYY-MM-DD&to=YYYY-MM-DD`
pub async fn report(
    State(ctx): State<ApiContext>,
    Path(user_id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse>, ApiError> {
    let store = store(&ctx)?;
    let today = chrono::Utc::now().date_naive();
    let range = DateRange::resolve(query.from.as_deref(), query.to.as_deref(), today)?;

    let entries = store.list_for_user(&user_id).await?;
    let report = journal::build_report(&entries, range);

    Ok(Json(ReportResponse {
        success: true,
        report,
    }))
}

/// `GET /api/journal/health`
pub async fn health() -> Json<MessageResponse> {
    Json(MessageResponse::ok("Journal routes healthy"))
}
