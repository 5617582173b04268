//! In-memory catalog cache with staleness tracking.
//!
//! The cache is the single source of truth consulted before any upstream
//! call for catalog data. It is volatile; a restart rebuilds it. Only
//! `bulk_update_shows` advances the freshness flag, so point updates from
//! webhooks keep entries current without suppressing the periodic full
//! refresh.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info};

use super::types::{Episode, Season, Series};

/// Default interval between full catalog refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Default)]
struct CacheState {
    shows: HashMap<i64, Series>,
    seasons: HashMap<(i64, i32), Season>,
    episodes: HashMap<(i64, i32, i32), Episode>,
    last_full_refresh: Option<Instant>,
}

/// In-memory store of show/season/episode entities.
///
/// All operations are local and total: absent data yields `None`, never an
/// error. Every operation completes without awaiting while the lock is
/// held, so no task can observe a partial update.
pub struct CatalogCache {
    state: RwLock<CacheState>,
    refresh_interval: Duration,
}

impl CatalogCache {
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            refresh_interval,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// True if the cache has never been fully refreshed or the refresh
    /// interval has elapsed since the last full refresh.
    pub async fn needs_update(&self) -> bool {
        let state = self.state.read().await;
        match state.last_full_refresh {
            None => true,
            Some(at) => at.elapsed() > self.refresh_interval,
        }
    }

    pub async fn get_show(&self, series_id: i64) -> Option<Series> {
        self.state.read().await.shows.get(&series_id).cloned()
    }

    pub async fn get_season(&self, series_id: i64, season_number: i32) -> Option<Season> {
        self.state
            .read()
            .await
            .seasons
            .get(&(series_id, season_number))
            .cloned()
    }

    pub async fn get_episode(
        &self,
        series_id: i64,
        season_number: i32,
        episode_number: i32,
    ) -> Option<Episode> {
        self.state
            .read()
            .await
            .episodes
            .get(&(series_id, season_number, episode_number))
            .cloned()
    }

    /// All cached shows, in no particular order.
    pub async fn all_shows(&self) -> Vec<Series> {
        self.state.read().await.shows.values().cloned().collect()
    }

    pub async fn show_count(&self) -> usize {
        self.state.read().await.shows.len()
    }

    /// Upsert a single show. Replaces any existing entry with the same id;
    /// does not affect the freshness flag.
    pub async fn update_show(&self, show: Series) {
        let mut state = self.state.write().await;
        debug!("Updated show cache for series {}", show.id);
        state.shows.insert(show.id, show);
    }

    /// Upsert a single season. Does not affect the freshness flag.
    pub async fn update_season(&self, series_id: i64, season_number: i32, season: Season) {
        let mut state = self.state.write().await;
        debug!("Updated season cache for {}_{}", series_id, season_number);
        state.seasons.insert((series_id, season_number), season);
    }

    /// Upsert a single episode. Does not affect the freshness flag.
    pub async fn update_episode(
        &self,
        series_id: i64,
        season_number: i32,
        episode_number: i32,
        episode: Episode,
    ) {
        let mut state = self.state.write().await;
        debug!(
            "Updated episode cache for {}_{}_{}",
            series_id, season_number, episode_number
        );
        state
            .episodes
            .insert((series_id, season_number, episode_number), episode);
    }

    /// Replace/merge many shows in one call and reset the freshness flag.
    ///
    /// This is the only operation that advances cache freshness.
    pub async fn bulk_update_shows(&self, shows: HashMap<i64, Series>) {
        let mut state = self.state.write().await;
        let count = shows.len();
        state.shows.extend(shows);
        state.last_full_refresh = Some(Instant::now());
        info!("Updated {} shows in cache", count);
    }

    /// Bulk season upsert without affecting freshness.
    pub async fn bulk_update_seasons(&self, seasons: HashMap<(i64, i32), Season>) {
        let mut state = self.state.write().await;
        let count = seasons.len();
        state.seasons.extend(seasons);
        info!("Updated {} seasons in cache", count);
    }

    /// Bulk episode upsert without affecting freshness.
    pub async fn bulk_update_episodes(&self, episodes: HashMap<(i64, i32, i32), Episode>) {
        let mut state = self.state.write().await;
        let count = episodes.len();
        state.episodes.extend(episodes);
        info!("Updated {} episodes in cache", count);
    }

    /// Drop all entries and reset freshness to "never refreshed".
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.shows.clear();
        state.seasons.clear();
        state.episodes.clear();
        state.last_full_refresh = None;
        info!("Cleared all cache data");
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}
