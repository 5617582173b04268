//! YouTube Data API v3 client.
//!
//! The API reports statistics counts as JSON strings; absent counts are
//! read as zero rather than failing the whole snapshot.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::YouTubeConfig;
use crate::metrics::EXTERNAL_REQUESTS;

use super::types::{ChannelStats, VideoStats};
use super::{ChannelMetrics, YouTubeError};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// Canonical channel-id shape: "UC" followed by 22 id characters.
static CHANNEL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^UC[0-9A-Za-z_-]{22}$").expect("channel id regex is valid"));

/// YouTube Data API client.
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(config: &YouTubeConfig) -> Result<Self, YouTubeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, YouTubeError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("YouTube GET {} {:?}", path, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .inspect_err(|_| {
                EXTERNAL_REQUESTS
                    .with_label_values(&["youtube", "error"])
                    .inc();
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            EXTERNAL_REQUESTS
                .with_label_values(&["youtube", "error"])
                .inc();
            return Err(YouTubeError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        EXTERNAL_REQUESTS
            .with_label_values(&["youtube", "success"])
            .inc();
        response
            .json::<T>()
            .await
            .map_err(|e| YouTubeError::ParseError(format!("Failed to parse {}: {}", path, e)))
    }
}

#[async_trait]
impl ChannelMetrics for YouTubeClient {
    async fn get_channel_stats(&self, channel_id: &str) -> Result<ChannelStats, YouTubeError> {
        let response: ListResponse<ChannelItem> = self
            .get_json(
                "/youtube/v3/channels",
                &[("part", "statistics,snippet"), ("id", channel_id)],
            )
            .await?;

        let channel = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| YouTubeError::NotFound(format!("Channel {}", channel_id)))?;

        Ok(ChannelStats {
            title: channel.snippet.title,
            subscriber_count: parse_count(channel.statistics.subscriber_count),
            video_count: parse_count(channel.statistics.video_count),
            view_count: parse_count(channel.statistics.view_count),
            published_at: channel.snippet.published_at,
        })
    }

    async fn get_video_stats(&self, video_id: &str) -> Result<VideoStats, YouTubeError> {
        let response: ListResponse<VideoItem> = self
            .get_json(
                "/youtube/v3/videos",
                &[("part", "statistics,snippet"), ("id", video_id)],
            )
            .await?;

        let video = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| YouTubeError::NotFound(format!("Video {}", video_id)))?;

        Ok(VideoStats {
            title: video.snippet.title,
            view_count: parse_count(video.statistics.view_count),
            like_count: parse_count(video.statistics.like_count),
            comment_count: parse_count(video.statistics.comment_count),
            published_at: video.snippet.published_at,
        })
    }

    async fn resolve_channel_id(&self, reference: &str) -> Result<String, YouTubeError> {
        // Already a canonical id
        if CHANNEL_ID_RE.is_match(reference) {
            return Ok(reference.to_string());
        }

        // Extract the interesting segment from URLs and strip @ from handles
        let mut name = reference.trim_matches('/');
        if let Some(last) = name.rsplit('/').next() {
            name = last;
        }
        let name = name.strip_prefix('@').unwrap_or(name);

        // Legacy username lookup first
        let by_username: ListResponse<IdItem> = self
            .get_json("/youtube/v3/channels", &[("part", "id"), ("forUsername", name)])
            .await?;
        if let Some(item) = by_username.items.into_iter().next() {
            if let ChannelRef::Plain(id) = item.id {
                return Ok(id);
            }
        }

        // Fall back to a channel search
        let search: ListResponse<IdItem> = self
            .get_json(
                "/youtube/v3/search",
                &[
                    ("part", "id"),
                    ("type", "channel"),
                    ("maxResults", "1"),
                    ("q", name),
                ],
            )
            .await?;

        match search.items.into_iter().next() {
            Some(IdItem {
                id: ChannelRef::Search { channel_id },
            }) => Ok(channel_id),
            Some(IdItem {
                id: ChannelRef::Plain(id),
            }) => Ok(id),
            None => Err(YouTubeError::NotFound(format!("Channel {}", reference))),
        }
    }
}

fn parse_count(raw: Option<String>) -> u64 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
}

// ============================================================================
// YouTube API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    snippet: Snippet,
    statistics: ChannelStatistics,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Snippet,
    statistics: VideoStatistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelStatistics {
    subscriber_count: Option<String>,
    video_count: Option<String>,
    view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdItem {
    id: ChannelRef,
}

/// `channels.list` returns the id as a plain string; `search.list` wraps it
/// in an object with a `channelId` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChannelRef {
    Plain(String),
    #[serde(rename_all = "camelCase")]
    Search {
        channel_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config(base_url: String) -> YouTubeConfig {
        YouTubeConfig {
            api_key: "yt-key".to_string(),
            channel: "@test".to_string(),
            base_url: Some(base_url),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_channel_id_regex() {
        assert!(CHANNEL_ID_RE.is_match("UCabcdefghijklmnopqrst12"));
        assert!(!CHANNEL_ID_RE.is_match("UCshort"));
        assert!(!CHANNEL_ID_RE.is_match("somename"));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(Some("100".to_string())), 100);
        assert_eq!(parse_count(Some("oops".to_string())), 0);
        assert_eq!(parse_count(None), 0);
    }

    #[tokio::test]
    async fn test_get_channel_stats() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/youtube/v3/channels")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("id".into(), "UCabcdefghijklmnopqrst12".into()),
                mockito::Matcher::UrlEncoded("key".into(), "yt-key".into()),
            ]))
            .with_body(
                json!({
                    "items": [{
                        "snippet": {"title": "My Channel", "publishedAt": "2019-01-01T00:00:00Z"},
                        "statistics": {
                            "subscriberCount": "100",
                            "viewCount": "5000",
                            "videoCount": "20"
                        }
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = YouTubeClient::new(&test_config(server.url())).unwrap();
        let stats = client
            .get_channel_stats("UCabcdefghijklmnopqrst12")
            .await
            .unwrap();

        assert_eq!(stats.title, "My Channel");
        assert_eq!(stats.subscriber_count, 100);
        assert_eq!(stats.view_count, 5000);
        assert_eq!(stats.video_count, 20);
    }

    #[tokio::test]
    async fn test_channel_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/youtube/v3/channels")
            .match_query(mockito::Matcher::Any)
            .with_body(json!({"items": []}).to_string())
            .create_async()
            .await;

        let client = YouTubeClient::new(&test_config(server.url())).unwrap();
        let err = client.get_channel_stats("UCmissing").await.unwrap_err();
        assert!(matches!(err, YouTubeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_resolve_channel_id_passthrough() {
        let server = mockito::Server::new_async().await;
        let client = YouTubeClient::new(&test_config(server.url())).unwrap();

        // No HTTP traffic: the canonical shape is accepted as-is
        let id = client
            .resolve_channel_id("UCabcdefghijklmnopqrst12")
            .await
            .unwrap();
        assert_eq!(id, "UCabcdefghijklmnopqrst12");
    }

    #[tokio::test]
    async fn test_resolve_channel_id_by_username() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/youtube/v3/channels")
            .match_query(mockito::Matcher::UrlEncoded(
                "forUsername".into(),
                "somename".into(),
            ))
            .with_body(json!({"items": [{"id": "UCabcdefghijklmnopqrst12"}]}).to_string())
            .create_async()
            .await;

        let client = YouTubeClient::new(&test_config(server.url())).unwrap();
        let id = client
            .resolve_channel_id("https://www.youtube.com/c/somename")
            .await
            .unwrap();
        assert_eq!(id, "UCabcdefghijklmnopqrst12");
    }

    #[tokio::test]
    async fn test_resolve_channel_id_handle_falls_back_to_search() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/youtube/v3/channels")
            .match_query(mockito::Matcher::UrlEncoded(
                "forUsername".into(),
                "handle".into(),
            ))
            .with_body(json!({"items": []}).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/youtube/v3/search")
            .match_query(mockito::Matcher::UrlEncoded("q".into(), "handle".into()))
            .with_body(
                json!({"items": [{"id": {"channelId": "UCabcdefghijklmnopqrst12"}}]}).to_string(),
            )
            .create_async()
            .await;

        let client = YouTubeClient::new(&test_config(server.url())).unwrap();
        let id = client.resolve_channel_id("@handle").await.unwrap();
        assert_eq!(id, "UCabcdefghijklmnopqrst12");
    }

    #[tokio::test]
    async fn test_get_video_stats() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/youtube/v3/videos")
            .match_query(mockito::Matcher::UrlEncoded("id".into(), "vid-1".into()))
            .with_body(
                json!({
                    "items": [{
                        "snippet": {"title": "A Video", "publishedAt": "2024-05-01T00:00:00Z"},
                        "statistics": {"viewCount": "321", "likeCount": "12", "commentCount": "3"}
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = YouTubeClient::new(&test_config(server.url())).unwrap();
        let stats = client.get_video_stats("vid-1").await.unwrap();

        assert_eq!(stats.title, "A Video");
        assert_eq!(stats.view_count, 321);
        assert_eq!(stats.like_count, 12);
        assert_eq!(stats.comment_count, 3);
    }
}
