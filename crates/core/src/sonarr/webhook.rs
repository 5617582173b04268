//! Webhook event reconciler.
//!
//! Applies partial updates pushed by the episode manager straight into the
//! catalog cache, bypassing the full-refresh path. Processing an event can
//! never fail: malformed or unrecognized events are logged and dropped so
//! the webhook endpoint always answers success and the sender never enters
//! a retry storm.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::metrics::WEBHOOK_EVENTS;

use super::cache::CatalogCache;
use super::types::{Episode, Series};

/// Incoming webhook payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub series: Option<WebhookSeries>,
    #[serde(default)]
    pub episodes: Vec<WebhookEpisode>,
}

/// Series object within a webhook payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSeries {
    pub id: i64,
    pub title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Episode object within a webhook payload. Number fields are optional;
/// events about whole-series operations omit them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEpisode {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub season_number: Option<i32>,
    #[serde(default)]
    pub episode_number: Option<i32>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub air_date: Option<NaiveDate>,
}

impl From<WebhookSeries> for Series {
    fn from(s: WebhookSeries) -> Self {
        Series {
            id: s.id,
            title: s.title,
            images: Vec::new(),
            extra: s.extra,
        }
    }
}

/// Applies webhook events to the catalog cache.
pub struct WebhookReconciler {
    cache: Arc<CatalogCache>,
}

impl WebhookReconciler {
    pub fn new(cache: Arc<CatalogCache>) -> Self {
        Self { cache }
    }

    /// Process one event. Each event is handled independently and
    /// atomically against the cache; this method never fails.
    pub async fn handle_event(&self, payload: WebhookPayload) {
        let Some(event_type) = payload.event_type.clone() else {
            error!("Received webhook with no eventType");
            WEBHOOK_EVENTS.with_label_values(&["missing"]).inc();
            return;
        };

        info!("Received webhook event: {}", event_type);
        WEBHOOK_EVENTS.with_label_values(&[event_type.as_str()]).inc();

        match event_type.as_str() {
            "Download" => self.on_download(payload).await,
            "Grab" => self.on_grab(&payload),
            "Rename" => self.on_rename(payload).await,
            other => warn!("Unhandled event type: {}", other),
        }
    }

    /// Download completed: the show record is refreshed and, when the
    /// payload carries episode numbers, the first episode is updated too.
    async fn on_download(&self, payload: WebhookPayload) {
        let Some(series) = payload.series else {
            warn!("Download event without series object, dropping");
            return;
        };
        let series_id = series.id;
        let series_title = series.title.clone();
        self.cache.update_show(series.into()).await;

        if let Some(episode) = payload.episodes.first() {
            if let (Some(season), Some(number)) =
                (episode.season_number, episode.episode_number)
            {
                info!(
                    "Download completed: {} - {}",
                    series_title,
                    episode.title.as_deref().unwrap_or("?")
                );
                self.cache
                    .update_episode(
                        series_id,
                        season,
                        number,
                        Episode {
                            id: episode.id,
                            series_id,
                            season_number: season,
                            episode_number: number,
                            title: episode.title.clone(),
                            air_date: episode.air_date,
                        },
                    )
                    .await;
            }
        }
    }

    /// Grab indicates a pending download, not confirmed content:
    /// log only, no cache mutation.
    fn on_grab(&self, payload: &WebhookPayload) {
        let series_title = payload
            .series
            .as_ref()
            .map(|s| s.title.as_str())
            .unwrap_or("?");
        let episode_title = payload
            .episodes
            .first()
            .and_then(|e| e.title.as_deref())
            .unwrap_or("?");
        info!("Episode grabbed: {} - {}", series_title, episode_title);
    }

    /// Rename: title/path may have changed; refresh the show record only.
    async fn on_rename(&self, payload: WebhookPayload) {
        let Some(series) = payload.series else {
            warn!("Rename event without series object, dropping");
            return;
        };
        debug!("Rename event for series: {}", series.title);
        self.cache.update_show(series.into()).await;
    }
}
