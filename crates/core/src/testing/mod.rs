//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of all external service
//! seams, allowing comprehensive testing without real infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use tellysync_core::testing::{fixtures, MockSeriesCatalog, MockTabularStore};
//!
//! let catalog = MockSeriesCatalog::new();
//! catalog.add_series(fixtures::series(10, "Show A")).await;
//! catalog.set_calendar(vec![fixtures::calendar_entry(501, 10, 2, 5, "2024-12-03")]).await;
//!
//! let store = MockTabularStore::new();
//! store.add_child_table("page-1", "Upcoming Episodes", "tbl-cal").await;
//! ```

mod mock_channel_metrics;
mod mock_series_catalog;
mod mock_tabular_store;

pub use mock_channel_metrics::MockChannelMetrics;
pub use mock_series_catalog::MockSeriesCatalog;
pub use mock_tabular_store::MockTabularStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::sonarr::{CalendarEntry, Episode, Series};
    use crate::youtube::ChannelStats;

    /// Create a test series with reasonable defaults.
    pub fn series(id: i64, title: &str) -> Series {
        let mut series = Series::new(id, title);
        series
            .extra
            .insert("status".to_string(), serde_json::json!("continuing"));
        series
    }

    /// Create a test episode.
    pub fn episode(series_id: i64, season: i32, number: i32, title: &str) -> Episode {
        Episode {
            id: series_id * 1000 + (season as i64) * 100 + number as i64,
            series_id,
            season_number: season,
            episode_number: number,
            title: Some(title.to_string()),
            air_date: None,
        }
    }

    /// Create a test calendar entry with an air date in `YYYY-MM-DD` form.
    pub fn calendar_entry(
        id: i64,
        series_id: i64,
        season: i32,
        number: i32,
        air_date: &str,
    ) -> CalendarEntry {
        CalendarEntry {
            id,
            series_id,
            season_number: season,
            episode_number: number,
            title: Some(format!("Episode {}", number)),
            air_date: air_date.parse().ok(),
        }
    }

    /// Create a test channel statistics snapshot.
    pub fn channel_stats(subscribers: u64, views: u64, videos: u64) -> ChannelStats {
        ChannelStats {
            title: "Test Channel".to_string(),
            subscriber_count: subscribers,
            view_count: views,
            video_count: videos,
            published_at: Some("2019-01-01T00:00:00Z".to_string()),
        }
    }
}
