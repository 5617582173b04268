//! Sonarr API client.
//!
//! Cache-first: lookups consult the [`CatalogCache`] before any network
//! call, a stale cache triggers one full-catalog fetch that is amortized
//! across subsequent lookups, and a single-entity fetch remains as the
//! fallback for ids the full refresh missed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{debug, info};

use crate::config::SonarrConfig;
use crate::metrics::{CACHE_REFRESHES, EXTERNAL_REQUESTS};

use super::cache::CatalogCache;
use super::types::{CalendarEntry, Episode, Season, Series};
use super::{SeriesCatalog, SonarrError};

/// How many per-series episode fetches run concurrently during pre-warm.
const PREWARM_CONCURRENCY: usize = 4;

/// Sonarr API client with a shared catalog cache.
pub struct SonarrClient {
    client: Client,
    base_url: String,
    api_key: String,
    cache: Arc<CatalogCache>,
}

impl SonarrClient {
    /// Create a new client sharing the given catalog cache.
    pub fn new(config: &SonarrConfig, cache: Arc<CatalogCache>) -> Result<Self, SonarrError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            cache,
        })
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    /// One full show fetch, then the full episode list of every show,
    /// grouped by season and bulk-loaded into the cache. Failures here are
    /// propagated; callers treat them as fatal to their startup sequence.
    pub async fn initialize_cache(&self) -> Result<(), SonarrError> {
        info!("Pre-warming catalog cache");
        self.refresh_all_series().await?;

        let series_ids: Vec<i64> = self
            .cache
            .all_shows()
            .await
            .into_iter()
            .map(|s| s.id)
            .collect();

        let episode_lists: Vec<Result<(i64, Vec<Episode>), SonarrError>> =
            stream::iter(series_ids)
                .map(|id| async move {
                    let episodes = self.fetch_episodes(id).await?;
                    Ok((id, episodes))
                })
                .buffer_unordered(PREWARM_CONCURRENCY)
                .collect()
                .await;

        let mut seasons = HashMap::new();
        let mut episodes = HashMap::new();
        for result in episode_lists {
            let (series_id, list) = result?;
            partition_into_cache_maps(series_id, list, &mut seasons, &mut episodes);
        }

        let season_count = seasons.len();
        self.cache.bulk_update_seasons(seasons).await;
        self.cache.bulk_update_episodes(episodes).await;
        info!(
            "Catalog cache pre-warmed: {} shows, {} seasons",
            self.cache.show_count().await,
            season_count
        );
        Ok(())
    }

    /// Fetch the full show list and replace the cached listing,
    /// advancing the freshness flag.
    async fn refresh_all_series(&self) -> Result<(), SonarrError> {
        let series: Vec<Series> = self.get_json("/api/v3/series", &[]).await?;
        let mapping: HashMap<i64, Series> = series.into_iter().map(|s| (s.id, s)).collect();
        self.cache.bulk_update_shows(mapping).await;
        CACHE_REFRESHES.inc();
        Ok(())
    }

    /// Single-entity fetch. `Ok(None)` on upstream 404.
    async fn fetch_series(&self, series_id: i64) -> Result<Option<Series>, SonarrError> {
        let url = format!("{}/api/v3/series/{}", self.base_url, series_id);
        debug!("Sonarr get series: id={}", series_id);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .inspect_err(|_| {
                EXTERNAL_REQUESTS
                    .with_label_values(&["sonarr", "error"])
                    .inc();
            })?;

        let status = response.status();
        if status == 404 {
            EXTERNAL_REQUESTS
                .with_label_values(&["sonarr", "success"])
                .inc();
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            EXTERNAL_REQUESTS
                .with_label_values(&["sonarr", "error"])
                .inc();
            return Err(SonarrError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        EXTERNAL_REQUESTS
            .with_label_values(&["sonarr", "success"])
            .inc();
        let series = response.json::<Series>().await.map_err(|e| {
            SonarrError::ParseError(format!("Failed to parse series response: {}", e))
        })?;
        Ok(Some(series))
    }

    async fn fetch_episodes(&self, series_id: i64) -> Result<Vec<Episode>, SonarrError> {
        self.get_json("/api/v3/episode", &[("seriesId", series_id.to_string())])
            .await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SonarrError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Sonarr GET {} {:?}", path, query);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(query)
            .send()
            .await
            .inspect_err(|_| {
                EXTERNAL_REQUESTS
                    .with_label_values(&["sonarr", "error"])
                    .inc();
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            EXTERNAL_REQUESTS
                .with_label_values(&["sonarr", "error"])
                .inc();
            return Err(SonarrError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        EXTERNAL_REQUESTS
            .with_label_values(&["sonarr", "success"])
            .inc();
        response
            .json::<T>()
            .await
            .map_err(|e| SonarrError::ParseError(format!("Failed to parse {}: {}", path, e)))
    }
}

#[async_trait]
impl SeriesCatalog for SonarrClient {
    async fn get_series(&self) -> Result<Vec<Series>, SonarrError> {
        if self.cache.needs_update().await {
            self.refresh_all_series().await?;
        }
        Ok(self.cache.all_shows().await)
    }

    async fn get_series_by_id(&self, series_id: i64) -> Result<Option<Series>, SonarrError> {
        if let Some(show) = self.cache.get_show(series_id).await {
            return Ok(Some(show));
        }

        // A stale cache gets one full refresh first; the refresh is
        // amortized across every lookup that follows it.
        if self.cache.needs_update().await {
            self.refresh_all_series().await?;
            if let Some(show) = self.cache.get_show(series_id).await {
                return Ok(Some(show));
            }
        }

        // The full refresh can miss an id created concurrently; a
        // single-entity fetch settles it either way.
        match self.fetch_series(series_id).await? {
            Some(show) => {
                self.cache.update_show(show.clone()).await;
                Ok(Some(show))
            }
            None => Ok(None),
        }
    }

    async fn get_season_by_series_id(
        &self,
        series_id: i64,
        season_number: i32,
    ) -> Result<Option<Season>, SonarrError> {
        if let Some(season) = self.cache.get_season(series_id, season_number).await {
            return Ok(Some(season));
        }

        let list = self.fetch_episodes(series_id).await?;
        let mut seasons = HashMap::new();
        let mut episodes = HashMap::new();
        partition_into_cache_maps(series_id, list, &mut seasons, &mut episodes);
        self.cache.bulk_update_seasons(seasons).await;
        self.cache.bulk_update_episodes(episodes).await;

        Ok(self.cache.get_season(series_id, season_number).await)
    }

    async fn get_episodes_by_series_id(
        &self,
        series_id: i64,
    ) -> Result<Vec<Episode>, SonarrError> {
        self.fetch_episodes(series_id).await
    }

    async fn get_episodes_calendar(
        &self,
        past_days: i64,
        future_days: i64,
    ) -> Result<Vec<CalendarEntry>, SonarrError> {
        let today = Utc::now().date_naive();
        let start = today - chrono::Duration::days(past_days);
        let end = today + chrono::Duration::days(future_days);

        self.get_json(
            "/api/v3/calendar",
            &[
                ("start", start.format("%Y-%m-%d").to_string()),
                ("end", end.format("%Y-%m-%d").to_string()),
            ],
        )
        .await
    }
}

/// Group a series' episode list by season number and produce the cache maps
/// for bulk insertion. Episodes within a season are ordered by number.
fn partition_into_cache_maps(
    series_id: i64,
    list: Vec<Episode>,
    seasons: &mut HashMap<(i64, i32), Season>,
    episodes: &mut HashMap<(i64, i32, i32), Episode>,
) {
    let mut by_season: HashMap<i32, Vec<Episode>> = HashMap::new();
    for episode in list {
        by_season
            .entry(episode.season_number)
            .or_default()
            .push(episode);
    }

    for (season_number, mut eps) in by_season {
        eps.sort_by_key(|e| e.episode_number);
        for episode in &eps {
            episodes.insert(
                (series_id, season_number, episode.episode_number),
                episode.clone(),
            );
        }
        seasons.insert(
            (series_id, season_number),
            Season {
                season_number,
                episode_count: eps.len(),
                episodes: eps,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sonarr::DEFAULT_REFRESH_INTERVAL;
    use serde_json::json;

    fn test_config(base_url: String) -> SonarrConfig {
        SonarrConfig {
            base_url,
            api_key: "test-key".to_string(),
            timeout_secs: 5,
            cache_refresh_hours: 12,
        }
    }

    fn client_with_cache(base_url: String) -> (SonarrClient, Arc<CatalogCache>) {
        let cache = Arc::new(CatalogCache::new(DEFAULT_REFRESH_INTERVAL));
        let client = SonarrClient::new(&test_config(base_url), Arc::clone(&cache)).unwrap();
        (client, cache)
    }

    fn series_json(id: i64, title: &str) -> serde_json::Value {
        json!({"id": id, "title": title, "images": [], "status": "continuing"})
    }

    #[test]
    fn test_partition_into_cache_maps() {
        let list = vec![
            Episode {
                id: 2,
                series_id: 10,
                season_number: 1,
                episode_number: 2,
                title: None,
                air_date: None,
            },
            Episode {
                id: 1,
                series_id: 10,
                season_number: 1,
                episode_number: 1,
                title: None,
                air_date: None,
            },
            Episode {
                id: 3,
                series_id: 10,
                season_number: 2,
                episode_number: 1,
                title: None,
                air_date: None,
            },
        ];

        let mut seasons = HashMap::new();
        let mut episodes = HashMap::new();
        partition_into_cache_maps(10, list, &mut seasons, &mut episodes);

        assert_eq!(seasons.len(), 2);
        assert_eq!(episodes.len(), 3);
        let season_one = &seasons[&(10, 1)];
        assert_eq!(season_one.episode_count, 2);
        // Ordered by episode number after partitioning
        assert_eq!(season_one.episodes[0].episode_number, 1);
        assert_eq!(season_one.episodes[1].episode_number, 2);
    }

    #[tokio::test]
    async fn test_get_series_by_id_fetches_once_within_staleness_window() {
        let mut server = mockito::Server::new_async().await;
        let full_listing = server
            .mock("GET", "/api/v3/series")
            .match_header("x-api-key", "test-key")
            .with_body(json!([series_json(10, "Show A")]).to_string())
            .expect(1)
            .create_async()
            .await;

        let (client, _cache) = client_with_cache(server.url());

        let first = client.get_series_by_id(10).await.unwrap().unwrap();
        assert_eq!(first.title, "Show A");

        // Second lookup is served from cache; the mock allows one call only.
        let second = client.get_series_by_id(10).await.unwrap().unwrap();
        assert_eq!(second.title, "Show A");

        full_listing.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_series_by_id_falls_back_to_single_fetch() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3/series")
            .with_body(json!([series_json(10, "Show A")]).to_string())
            .create_async()
            .await;
        let single = server
            .mock("GET", "/api/v3/series/99")
            .with_body(series_json(99, "Brand New").to_string())
            .expect(1)
            .create_async()
            .await;

        let (client, cache) = client_with_cache(server.url());

        // Not in the full listing, so the client falls through to the
        // single-entity fetch and caches the result.
        let show = client.get_series_by_id(99).await.unwrap().unwrap();
        assert_eq!(show.title, "Brand New");
        assert!(cache.get_show(99).await.is_some());

        single.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_series_by_id_not_found_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3/series")
            .with_body("[]")
            .create_async()
            .await;
        server
            .mock("GET", "/api/v3/series/404")
            .with_status(404)
            .create_async()
            .await;

        let (client, _cache) = client_with_cache(server.url());

        let result = client.get_series_by_id(404).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_get_series_transport_error_is_err() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3/series")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let (client, _cache) = client_with_cache(server.url());

        let err = client.get_series().await.unwrap_err();
        assert!(matches!(err, SonarrError::ApiError { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_get_season_builds_and_caches_seasons() {
        let mut server = mockito::Server::new_async().await;
        let episodes = server
            .mock("GET", "/api/v3/episode")
            .match_query(mockito::Matcher::UrlEncoded(
                "seriesId".into(),
                "10".into(),
            ))
            .with_body(
                json!([
                    {"id": 1, "seriesId": 10, "seasonNumber": 1, "episodeNumber": 1, "title": "a"},
                    {"id": 2, "seriesId": 10, "seasonNumber": 1, "episodeNumber": 2, "title": "b"},
                    {"id": 3, "seriesId": 10, "seasonNumber": 2, "episodeNumber": 1, "title": "c"},
                ])
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let (client, cache) = client_with_cache(server.url());

        let season = client.get_season_by_series_id(10, 1).await.unwrap().unwrap();
        assert_eq!(season.episode_count, 2);

        // Both seasons and the individual episodes landed in the cache
        assert!(cache.get_season(10, 2).await.is_some());
        assert!(cache.get_episode(10, 2, 1).await.is_some());

        // Second request for the other season is a pure cache hit
        let other = client.get_season_by_series_id(10, 2).await.unwrap().unwrap();
        assert_eq!(other.episode_count, 1);
        episodes.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_season_absent_number_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3/episode")
            .match_query(mockito::Matcher::Any)
            .with_body("[]")
            .create_async()
            .await;

        let (client, _cache) = client_with_cache(server.url());
        let season = client.get_season_by_series_id(10, 7).await.unwrap();
        assert!(season.is_none());
    }

    #[tokio::test]
    async fn test_calendar_passes_window_dates() {
        let mut server = mockito::Server::new_async().await;
        let today = Utc::now().date_naive();
        let start = (today - chrono::Duration::days(7)).format("%Y-%m-%d").to_string();
        let end = (today + chrono::Duration::days(14)).format("%Y-%m-%d").to_string();

        let calendar = server
            .mock("GET", "/api/v3/calendar")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("start".into(), start),
                mockito::Matcher::UrlEncoded("end".into(), end),
            ]))
            .with_body(
                json!([
                    {"id": 501, "seriesId": 10, "seasonNumber": 2, "episodeNumber": 5,
                     "title": "The One", "airDate": "2024-12-03"},
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let (client, cache) = client_with_cache(server.url());
        let entries = client.get_episodes_calendar(7, 14).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].series_id, 10);
        // The calendar does not touch the cache
        assert_eq!(cache.show_count().await, 0);
        calendar.assert_async().await;
    }

    #[tokio::test]
    async fn test_initialize_cache_prewarms_everything() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3/series")
            .with_body(json!([series_json(10, "Show A"), series_json(11, "Show B")]).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/api/v3/episode")
            .match_query(mockito::Matcher::UrlEncoded(
                "seriesId".into(),
                "10".into(),
            ))
            .with_body(
                json!([{"id": 1, "seriesId": 10, "seasonNumber": 1, "episodeNumber": 1}])
                    .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", "/api/v3/episode")
            .match_query(mockito::Matcher::UrlEncoded(
                "seriesId".into(),
                "11".into(),
            ))
            .with_body(
                json!([{"id": 2, "seriesId": 11, "seasonNumber": 3, "episodeNumber": 9}])
                    .to_string(),
            )
            .create_async()
            .await;

        let (client, cache) = client_with_cache(server.url());
        client.initialize_cache().await.unwrap();

        assert!(!cache.needs_update().await);
        assert_eq!(cache.show_count().await, 2);
        assert!(cache.get_episode(10, 1, 1).await.is_some());
        assert!(cache.get_episode(11, 3, 9).await.is_some());
    }

    #[tokio::test]
    async fn test_initialize_cache_propagates_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v3/series")
            .with_status(503)
            .create_async()
            .await;

        let (client, _cache) = client_with_cache(server.url());
        assert!(client.initialize_cache().await.is_err());
    }
}
