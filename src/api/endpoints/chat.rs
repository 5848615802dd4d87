//! Chat endpoint: one message in, one model reply out. No history is kept.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, AI_UNAVAILABLE};
use crate::api::types::ApiContext;

#[derive(Deserialize, Default)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub reply: String,
}

/// `POST /api/chat`
pub async fn send(
    State(ctx): State<ApiContext>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let message = request
        .message
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Message is required".into()))?;

    let generator = ctx
        .core
        .generator()
        .ok_or_else(|| ApiError::Internal(AI_UNAVAILABLE.into()))?;

    let reply = generator.generate(&message).await.map_err(|e| {
        tracing::error!(error = %e, "Chat generation failed");
        ApiError::Internal(e.to_string())
    })?;

    Ok(Json(ChatResponse {
        success: true,
        reply,
    }))
}
