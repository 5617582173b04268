//! Video platform (YouTube Data API v3) integration.
//!
//! Read-only client for channel statistics and channel-id resolution.

mod client;
mod types;

pub use client::YouTubeClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the metrics API.
#[derive(Debug, Error)]
pub enum YouTubeError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Channel or video not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Trait for channel metrics providers.
#[async_trait]
pub trait ChannelMetrics: Send + Sync {
    /// Subscriber/video/view counts for a channel.
    async fn get_channel_stats(&self, channel_id: &str) -> Result<ChannelStats, YouTubeError>;

    /// View/like/comment counts for a single video.
    async fn get_video_stats(&self, video_id: &str) -> Result<VideoStats, YouTubeError>;

    /// Resolve a channel id from a URL, @handle, username or raw id.
    async fn resolve_channel_id(&self, reference: &str) -> Result<String, YouTubeError>;
}
