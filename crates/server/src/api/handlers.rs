use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tellysync_core::{SanitizedConfig, SyncStatus};

use super::{error, success, ApiErrorBody, ApiSuccess};
use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /sync/status
pub async fn sync_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiSuccess<SyncStatus>>, (StatusCode, Json<ApiErrorBody>)> {
    match state.orchestrator() {
        Some(orchestrator) => Ok(success(orchestrator.status().await)),
        None => Err(error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Sync driver not configured",
        )),
    }
}

/// GET /metrics — Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    collect_dynamic_metrics(&state).await;
    encode_metrics()
}
