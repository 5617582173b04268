//! Mock episode catalog for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::sonarr::{
    CalendarEntry, Episode, Season, Series, SeriesCatalog, SonarrError,
};

#[derive(Default)]
struct MockCatalogState {
    series: HashMap<i64, Series>,
    episodes: HashMap<i64, Vec<Episode>>,
    calendar: Vec<CalendarEntry>,
    next_error: Option<SonarrError>,
    lookups: Vec<i64>,
}

/// Mock implementation of the [`SeriesCatalog`] trait.
///
/// Configure series, episodes and calendar entries; lookups against
/// unknown ids return `Ok(None)` like the real client does for an
/// upstream not-found.
pub struct MockSeriesCatalog {
    state: Arc<RwLock<MockCatalogState>>,
}

impl Default for MockSeriesCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSeriesCatalog {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockCatalogState::default())),
        }
    }

    pub async fn add_series(&self, series: Series) {
        self.state.write().await.series.insert(series.id, series);
    }

    pub async fn set_episodes(&self, series_id: i64, episodes: Vec<Episode>) {
        self.state.write().await.episodes.insert(series_id, episodes);
    }

    pub async fn set_calendar(&self, entries: Vec<CalendarEntry>) {
        self.state.write().await.calendar = entries;
    }

    /// Configure the next catalog call to fail with the given error.
    pub async fn set_next_error(&self, error: SonarrError) {
        self.state.write().await.next_error = Some(error);
    }

    /// Series ids that were looked up, in order.
    pub async fn recorded_lookups(&self) -> Vec<i64> {
        self.state.read().await.lookups.clone()
    }
}

#[async_trait]
impl SeriesCatalog for MockSeriesCatalog {
    async fn get_series(&self) -> Result<Vec<Series>, SonarrError> {
        let mut state = self.state.write().await;
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        Ok(state.series.values().cloned().collect())
    }

    async fn get_series_by_id(&self, series_id: i64) -> Result<Option<Series>, SonarrError> {
        let mut state = self.state.write().await;
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        state.lookups.push(series_id);
        Ok(state.series.get(&series_id).cloned())
    }

    async fn get_season_by_series_id(
        &self,
        series_id: i64,
        season_number: i32,
    ) -> Result<Option<Season>, SonarrError> {
        let mut state = self.state.write().await;
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }

        let mut episodes: Vec<Episode> = state
            .episodes
            .get(&series_id)
            .map(|eps| {
                eps.iter()
                    .filter(|e| e.season_number == season_number)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if episodes.is_empty() {
            return Ok(None);
        }
        episodes.sort_by_key(|e| e.episode_number);
        Ok(Some(Season {
            season_number,
            episode_count: episodes.len(),
            episodes,
        }))
    }

    async fn get_episodes_by_series_id(
        &self,
        series_id: i64,
    ) -> Result<Vec<Episode>, SonarrError> {
        let mut state = self.state.write().await;
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        Ok(state.episodes.get(&series_id).cloned().unwrap_or_default())
    }

    async fn get_episodes_calendar(
        &self,
        _past_days: i64,
        _future_days: i64,
    ) -> Result<Vec<CalendarEntry>, SonarrError> {
        let mut state = self.state.write().await;
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        Ok(state.calendar.clone())
    }
}
