//! Liveness endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::{ApiContext, MessageResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub uptime_secs: u64,
    pub analyses_held: usize,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "Backend healthy".into(),
        uptime_secs: ctx.core.uptime_secs(),
        analyses_held: ctx.core.analyses.count(),
    })
}

/// `GET /api/logtest`: confirms request logging reaches the output.
pub async fn log_test() -> Json<MessageResponse> {
    tracing::info!("Log test route hit");
    Json(MessageResponse::ok("Log test route hit!"))
}
