//! Types for the periodic sync driver.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::notion::NotionError;
use crate::sonarr::SonarrError;
use crate::youtube::YouTubeError;

/// Errors surfaced by a sync pass.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("catalog error: {0}")]
    Catalog(#[from] SonarrError),

    #[error("tabular store error: {0}")]
    Store(#[from] NotionError),

    #[error("metrics error: {0}")]
    Metrics(#[from] YouTubeError),
}

/// Snapshot of the driver state.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub running: bool,
    pub last_catalog_sync: Option<DateTime<Utc>>,
    pub last_stats_sync: Option<DateTime<Utc>>,
}

/// Result of one catalog sync pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogSyncOutcome {
    /// Calendar entries seen in the window.
    pub entries: usize,
    /// Rows created or updated.
    pub rows_upserted: usize,
    /// Stale rows deleted ahead of the window.
    pub rows_deleted: u64,
    /// Entries skipped (missing series or air date).
    pub entries_skipped: usize,
}

/// Result of one channel-stats sync pass.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSyncOutcome {
    /// Rows removed by the table clear.
    pub rows_cleared: u64,
    pub subscriber_count: u64,
    pub view_count: u64,
    pub video_count: u64,
}
