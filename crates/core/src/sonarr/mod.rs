//! Episode manager (Sonarr) integration.
//!
//! This module contains the in-memory catalog cache, the cache-first API
//! client, and the webhook reconciler that applies partial updates pushed
//! by the episode manager.

mod cache;
mod client;
mod types;
mod webhook;

pub use cache::{CatalogCache, DEFAULT_REFRESH_INTERVAL};
pub use client::SonarrClient;
pub use types::*;
pub use webhook::{WebhookEpisode, WebhookPayload, WebhookReconciler, WebhookSeries};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the episode manager.
///
/// A not-found response for a single-entity fetch is NOT an error; it is
/// modeled as `Ok(None)` by the lookup methods.
#[derive(Debug, Error)]
pub enum SonarrError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Trait for episode catalog providers.
///
/// Implemented by [`SonarrClient`] and by the mock in `testing/`.
#[async_trait]
pub trait SeriesCatalog: Send + Sync {
    /// Full show list; triggers a full cache refresh when stale.
    async fn get_series(&self) -> Result<Vec<Series>, SonarrError>;

    /// Single show lookup: cache first, full refresh when stale, then a
    /// single-entity fetch. `Ok(None)` when upstream reports not-found.
    async fn get_series_by_id(&self, series_id: i64) -> Result<Option<Series>, SonarrError>;

    /// Episode list of one season, built and cached from the full episode
    /// set of the series when absent.
    async fn get_season_by_series_id(
        &self,
        series_id: i64,
        season_number: i32,
    ) -> Result<Option<Season>, SonarrError>;

    /// All episodes of a series, straight from upstream.
    async fn get_episodes_by_series_id(
        &self,
        series_id: i64,
    ) -> Result<Vec<Episode>, SonarrError>;

    /// Calendar entries in the closed window
    /// `[today - past_days, today + future_days]`. Does not touch the cache.
    async fn get_episodes_calendar(
        &self,
        past_days: i64,
        future_days: i64,
    ) -> Result<Vec<CalendarEntry>, SonarrError>;
}
