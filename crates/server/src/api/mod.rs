//! HTTP API surface.

mod handlers;
mod middleware;
mod routes;
mod series;
mod webhook;

pub use routes::create_router;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Success envelope: `{"status": "success", "data": …}`.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    pub status: &'static str,
    pub data: T,
}

/// Error envelope: `{"status": "error", "message": …}`.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub status: &'static str,
    pub message: String,
}

pub fn success<T: Serialize>(data: T) -> Json<ApiSuccess<T>> {
    Json(ApiSuccess {
        status: "success",
        data,
    })
}

pub fn error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiErrorBody>) {
    (
        status,
        Json(ApiErrorBody {
            status: "error",
            message: message.into(),
        }),
    )
}
