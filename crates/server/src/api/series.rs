//! Read-only catalog handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tellysync_core::{CalendarEntry, Episode, SeriesCatalog, Series};
use tracing::error;

use super::{error, success, ApiErrorBody, ApiSuccess};
use crate::state::AppState;

type ApiResult<T> = Result<Json<ApiSuccess<T>>, (StatusCode, Json<ApiErrorBody>)>;

fn catalog(
    state: &AppState,
) -> Result<&Arc<dyn SeriesCatalog>, (StatusCode, Json<ApiErrorBody>)> {
    state.catalog().ok_or_else(|| {
        error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Episode manager not configured",
        )
    })
}

fn upstream_error(e: impl std::fmt::Display) -> (StatusCode, Json<ApiErrorBody>) {
    error!("Catalog request failed: {}", e);
    error(StatusCode::BAD_GATEWAY, e.to_string())
}

/// GET /series
pub async fn get_series(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Series>> {
    let catalog = catalog(&state)?;
    match catalog.get_series().await {
        Ok(series) => Ok(success(series)),
        Err(e) => Err(upstream_error(e)),
    }
}

/// GET /series/{id}
pub async fn get_series_by_id(
    State(state): State<Arc<AppState>>,
    Path(series_id): Path<i64>,
) -> ApiResult<Series> {
    let catalog = catalog(&state)?;
    match catalog.get_series_by_id(series_id).await {
        Ok(Some(series)) => Ok(success(series)),
        Ok(None) => Err(error(
            StatusCode::NOT_FOUND,
            format!("Series {} not found", series_id),
        )),
        Err(e) => Err(upstream_error(e)),
    }
}

#[derive(Debug, Deserialize)]
pub struct EpisodesQuery {
    pub season_number: Option<i32>,
}

/// GET /series/{id}/episodes?season_number=
pub async fn get_episodes(
    State(state): State<Arc<AppState>>,
    Path(series_id): Path<i64>,
    Query(query): Query<EpisodesQuery>,
) -> ApiResult<Vec<Episode>> {
    let catalog = catalog(&state)?;

    match query.season_number {
        Some(season_number) => {
            match catalog
                .get_season_by_series_id(series_id, season_number)
                .await
            {
                Ok(Some(season)) => Ok(success(season.episodes)),
                Ok(None) => Err(error(
                    StatusCode::NOT_FOUND,
                    format!("Series {} has no season {}", series_id, season_number),
                )),
                Err(e) => Err(upstream_error(e)),
            }
        }
        None => match catalog.get_episodes_by_series_id(series_id).await {
            Ok(episodes) => Ok(success(episodes)),
            Err(e) => Err(upstream_error(e)),
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    #[serde(default = "default_window_days")]
    pub past_days: i64,
    #[serde(default = "default_window_days")]
    pub future_days: i64,
}

fn default_window_days() -> i64 {
    7
}

/// GET /calendar?past_days=&future_days=
pub async fn get_calendar(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Vec<CalendarEntry>> {
    let catalog = catalog(&state)?;
    match catalog
        .get_episodes_calendar(query.past_days, query.future_days)
        .await
    {
        Ok(entries) => Ok(success(entries)),
        Err(e) => Err(upstream_error(e)),
    }
}
