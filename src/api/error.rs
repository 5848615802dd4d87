//! API error type and the JSON error envelope.
//!
//! Every failure answers `{ "success": false, "message", "error"?, "reason"? }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core_state::CoreError;
use crate::db::DatabaseError;
use crate::journal::JournalError;
use crate::pipeline::ProcessingError;
use crate::remedies::RemedyError;
use crate::report::ReportError;

pub const VISION_FAILED: &str =
    "Google Vision API failed. Please check service account permissions and ensure the API is enabled.";
pub const AI_FAILED: &str = "AI response is not valid JSON or Gemini failed";
pub const AI_BLOCKED: &str = "AI content generation failed or was blocked.";
pub const AI_UNAVAILABLE: &str = "AI service unavailable";
pub const DB_UNAVAILABLE: &str = "Database service is unavailable.";
pub const NO_FILE: &str = "No file uploaded.";
pub const ROUTE_NOT_FOUND: &str = "API route not found";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Missing env vars: {}", .0.join(", "))]
    Misconfigured(Vec<String>),
    /// Vendor failure with a fixed message and the underlying detail.
    #[error("{message}")]
    Upstream {
        message: String,
        error: Option<String>,
    },
    #[error("Generation blocked: {reason}")]
    Blocked { reason: String },
    /// 500 whose message is the underlying error text.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn upstream(message: &str, error: impl ToString) -> Self {
        ApiError::Upstream {
            message: message.to_string(),
            error: Some(error.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Misconfigured(_)
            | ApiError::Upstream { .. }
            | ApiError::Blocked { .. }
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_body(self) -> ErrorBody {
        let (message, error, reason) = match self {
            ApiError::BadRequest(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m)
            | ApiError::ServiceUnavailable(m) => (m, None, None),
            ApiError::Misconfigured(missing) => (
                format!("Server misconfigured. Missing env vars: {}", missing.join(", ")),
                None,
                None,
            ),
            ApiError::Upstream { message, error } => (message, error, None),
            ApiError::Blocked { reason } => (AI_BLOCKED.to_string(), None, Some(reason)),
            ApiError::Internal(detail) => (detail, None, None),
        };
        ErrorBody {
            success: false,
            message,
            error,
            reason,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "API request failed");
        }
        (status, Json(self.into_body())).into_response()
    }
}

impl From<ProcessingError> for ApiError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::Ocr(e) => ApiError::upstream(VISION_FAILED, e),
            ProcessingError::NoText => ApiError::BadRequest("No text found in image.".into()),
            ProcessingError::Blocked(reason) => ApiError::Blocked { reason },
            other @ (ProcessingError::AiUnavailable
            | ProcessingError::Generation(_)
            | ProcessingError::InvalidJson(_)) => ApiError::upstream(AI_FAILED, other),
        }
    }
}

impl From<RemedyError> for ApiError {
    fn from(err: RemedyError) -> Self {
        match err {
            RemedyError::NoConditions => ApiError::BadRequest(err.to_string()),
            RemedyError::SearchUnavailable(_) => ApiError::Upstream {
                message: err.to_string(),
                error: None,
            },
            RemedyError::AlreadySeeded => ApiError::Conflict(err.to_string()),
            RemedyError::Database(e) => {
                ApiError::upstream("An error occurred while searching for remedies.", e)
            }
        }
    }
}

impl From<JournalError> for ApiError {
    fn from(err: JournalError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::upstream("Could not generate the analysis report.", err)
    }
}
