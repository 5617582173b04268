//! Webhook ingress.
//!
//! The endpoint always answers success: a malformed payload is logged and
//! dropped so the sender never retries a body we will never accept.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};
use tellysync_core::WebhookPayload;
use tracing::error;

use crate::state::AppState;

/// POST /webhook
pub async fn webhook(State(state): State<Arc<AppState>>, body: Bytes) -> Json<Value> {
    match serde_json::from_slice::<WebhookPayload>(&body) {
        Ok(payload) => state.reconciler().handle_event(payload).await,
        Err(e) => error!("Malformed webhook payload, dropping: {}", e),
    }

    Json(json!({"status": "success"}))
}
