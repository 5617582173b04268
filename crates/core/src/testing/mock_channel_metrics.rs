//! Mock channel metrics provider for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::youtube::{ChannelMetrics, ChannelStats, VideoStats, YouTubeError};

#[derive(Default)]
struct MockMetricsState {
    channel_stats: Option<ChannelStats>,
    video_stats: Option<VideoStats>,
    next_error: Option<YouTubeError>,
    stats_requests: u64,
    resolve_requests: u64,
}

/// Mock implementation of the [`ChannelMetrics`] trait.
pub struct MockChannelMetrics {
    state: Arc<RwLock<MockMetricsState>>,
}

impl Default for MockChannelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChannelMetrics {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockMetricsState::default())),
        }
    }

    pub async fn set_channel_stats(&self, stats: ChannelStats) {
        self.state.write().await.channel_stats = Some(stats);
    }

    pub async fn set_video_stats(&self, stats: VideoStats) {
        self.state.write().await.video_stats = Some(stats);
    }

    /// Configure the next metrics call to fail with the given error.
    pub async fn set_next_error(&self, error: YouTubeError) {
        self.state.write().await.next_error = Some(error);
    }

    pub async fn stats_request_count(&self) -> u64 {
        self.state.read().await.stats_requests
    }

    pub async fn resolve_request_count(&self) -> u64 {
        self.state.read().await.resolve_requests
    }
}

#[async_trait]
impl ChannelMetrics for MockChannelMetrics {
    async fn get_channel_stats(&self, channel_id: &str) -> Result<ChannelStats, YouTubeError> {
        let mut state = self.state.write().await;
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        state.stats_requests += 1;
        state
            .channel_stats
            .clone()
            .ok_or_else(|| YouTubeError::NotFound(format!("Channel {}", channel_id)))
    }

    async fn get_video_stats(&self, video_id: &str) -> Result<VideoStats, YouTubeError> {
        let mut state = self.state.write().await;
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        state
            .video_stats
            .clone()
            .ok_or_else(|| YouTubeError::NotFound(format!("Video {}", video_id)))
    }

    async fn resolve_channel_id(&self, reference: &str) -> Result<String, YouTubeError> {
        let mut state = self.state.write().await;
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        state.resolve_requests += 1;
        // Pass the reference through as the resolved id
        Ok(reference.to_string())
    }
}
