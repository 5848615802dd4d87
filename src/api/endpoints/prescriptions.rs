//! Prescription upload endpoint.
//!
//! `POST /api/prescriptions/upload`: multipart form with one `image` file.
//! The image stays in memory; the analysis is stored under a fresh id.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::api::error::{ApiError, NO_FILE};
use crate::api::types::ApiContext;
use crate::pipeline::analyze_prescription;
use crate::pipeline::extraction::UploadedImage;
use crate::prescription::PrescriptionAnalysis;

/// Multipart field carrying the prescription image.
pub const IMAGE_FIELD: &str = "image";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub analysis_id: String,
    pub analysis: PrescriptionAnalysis,
}

/// Pull the `image` field out of the form. Other fields are skipped.
async fn read_image(mut multipart: Multipart) -> Result<Option<UploadedImage>, ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) => return Err(ApiError::Internal(format!("File upload error: {}", e.body_text()))),
        };
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Internal(format!("File upload error: {}", e.body_text())))?;
        if bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(UploadedImage {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
}

/// `POST /api/prescriptions/upload`: OCR, analyse and store one image.
pub async fn upload(
    State(ctx): State<ApiContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Upload without a multipart body");
        ApiError::BadRequest(NO_FILE.into())
    })?;
    let image = read_image(multipart)
        .await?
        .ok_or_else(|| ApiError::BadRequest(NO_FILE.into()))?;

    tracing::info!(
        file = %image.file_name,
        content_type = ?image.content_type,
        size = image.bytes.len(),
        "Prescription upload received"
    );

    let analysis = analyze_prescription(ctx.core.ocr(), ctx.core.generator(), &image).await?;
    let analysis_id = ctx.core.analyses.insert(analysis.clone())?;

    Ok(Json(UploadResponse {
        success: true,
        analysis_id,
        analysis,
    }))
}
