//! Stored analysis endpoints.
//!
//! - `GET /api/analysis/:id`: the analysis as JSON
//! - `GET /api/analysis/:id/report`: the analysis as a PDF download

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::prescription::PrescriptionAnalysis;
use crate::report;

const NOT_FOUND: &str = "Prescription not found";

#[derive(Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub analysis: PrescriptionAnalysis,
}

fn lookup(ctx: &ApiContext, id: &str) -> Result<PrescriptionAnalysis, ApiError> {
    ctx.core
        .analyses
        .get(id)?
        .ok_or_else(|| ApiError::NotFound(NOT_FOUND.into()))
}

/// `GET /api/analysis/:id`
pub async fn get(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let analysis = lookup(&ctx, &id)?;
    Ok(Json(AnalysisResponse {
        success: true,
        analysis,
    }))
}

/// `GET /api/analysis/:id/report`
pub async fn report(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let analysis = lookup(&ctx, &id)?;
    let file_name = report::report_file_name(&analysis);

    let bytes = tokio::task::spawn_blocking(move || report::generate_analysis_pdf(&analysis))
        .await
        .map_err(|e| ApiError::Internal(format!("Report task failed: {e}")))??;

    tracing::info!(%id, size = bytes.len(), "Analysis report generated");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
