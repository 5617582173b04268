//! Types for the channel metrics API.

use serde::{Deserialize, Serialize};

/// Channel statistics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelStats {
    pub title: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub view_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// Single-video statistics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStats {
    pub title: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}
