//! Types for the episode catalog.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A show as reported by the episode manager.
///
/// Only the fields the sync passes need are typed; everything else Sonarr
/// sends rides along in `extra` and is passed through untouched. Each update
/// replaces the whole record for an id, never a partial merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<SeriesImage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An image attached to a series (poster, banner, fanart).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

/// A single episode of a series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: i64,
    pub series_id: i64,
    pub season_number: i32,
    pub episode_number: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<NaiveDate>,
}

/// A season, derived from the episode set of a series.
///
/// Rebuilt on demand; never fetched from upstream as its own entity.
#[derive(Debug, Clone, Serialize)]
pub struct Season {
    pub season_number: i32,
    pub episode_count: usize,
    pub episodes: Vec<Episode>,
}

/// A raw calendar row from the episode manager.
///
/// Calendar entries reference their series by id only; callers resolve the
/// series against the catalog cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: i64,
    pub series_id: i64,
    pub season_number: i32,
    pub episode_number: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<NaiveDate>,
}

impl Series {
    /// Build a series record from the minimal identity fields, keeping any
    /// remaining payload fields as the opaque pass-through bag.
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            images: Vec::new(),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_deserialize_keeps_extra_fields() {
        let json = r#"{
            "id": 10,
            "title": "Show A",
            "images": [{"coverType": "poster", "remoteUrl": "http://img/poster.jpg"}],
            "status": "continuing",
            "network": "HBO"
        }"#;

        let series: Series = serde_json::from_str(json).unwrap();
        assert_eq!(series.id, 10);
        assert_eq!(series.title, "Show A");
        assert_eq!(series.images.len(), 1);
        assert_eq!(
            series.images[0].remote_url.as_deref(),
            Some("http://img/poster.jpg")
        );
        assert_eq!(series.extra.get("network").unwrap(), "HBO");

        // Round-trips with the extra fields intact
        let back = serde_json::to_value(&series).unwrap();
        assert_eq!(back["status"], "continuing");
    }

    #[test]
    fn test_episode_deserialize_camel_case() {
        let json = r#"{
            "id": 501,
            "seriesId": 10,
            "seasonNumber": 2,
            "episodeNumber": 5,
            "title": "The One",
            "airDate": "2024-12-03"
        }"#;

        let episode: Episode = serde_json::from_str(json).unwrap();
        assert_eq!(episode.series_id, 10);
        assert_eq!(episode.season_number, 2);
        assert_eq!(episode.episode_number, 5);
        assert_eq!(
            episode.air_date.unwrap().to_string(),
            "2024-12-03".to_string()
        );
    }

    #[test]
    fn test_calendar_entry_missing_air_date() {
        let json = r#"{"id": 1, "seriesId": 2, "seasonNumber": 1, "episodeNumber": 3}"#;
        let entry: CalendarEntry = serde_json::from_str(json).unwrap();
        assert!(entry.air_date.is_none());
        assert!(entry.title.is_none());
    }
}
