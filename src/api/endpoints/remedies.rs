//! Natural remedy endpoints.
//!
//! - `POST /api/remedies/search-and-summarize`: search, enrich and summarize
//! - `GET /api/remedies/seed`: load the built-in remedies into an empty collection
//! - `GET /api/remedies/diagnose`: collection and search index health

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, MessageResponse};
use crate::remedies::{self, Diagnostics, RemedyError, SearchOutcome};

#[derive(Serialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: SearchOutcome,
}

/// `POST /api/remedies/search-and-summarize` `{ conditions: string[] }`
pub async fn search_and_summarize(
    State(ctx): State<ApiContext>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let body = payload.map(|Json(v)| v).unwrap_or(Value::Null);
    let conditions = remedies::parse_conditions(&body)?;

    let outcome =
        remedies::search_and_summarize(ctx.core.remedies(), ctx.core.generator(), &conditions)
            .await?;

    Ok(Json(SearchResponse {
        success: true,
        outcome,
    }))
}

/// `GET /api/remedies/seed`
pub async fn seed(State(ctx): State<ApiContext>) -> Result<Json<MessageResponse>, ApiError> {
    let inserted = remedies::seed(ctx.core.remedies()).await.map_err(|e| match e {
        RemedyError::Database(db) => {
            ApiError::upstream("An error occurred while seeding the database.", db)
        }
        other => ApiError::from(other),
    })?;

    Ok(Json(MessageResponse::ok(format!(
        "Successfully seeded the database with {inserted} remedies."
    ))))
}

#[derive(Serialize)]
pub struct DiagnoseResponse {
    pub success: bool,
    pub diagnostics: Diagnostics,
}

/// `GET /api/remedies/diagnose`: 500 with the partial diagnostics on failure.
pub async fn diagnose(State(ctx): State<ApiContext>) -> Response {
    match remedies::diagnose(ctx.core.remedies()).await {
        Ok(diagnostics) => Json(DiagnoseResponse {
            success: true,
            diagnostics,
        })
        .into_response(),
        Err(diagnostics) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(DiagnoseResponse {
                success: false,
                diagnostics,
            }),
        )
            .into_response(),
    }
}
