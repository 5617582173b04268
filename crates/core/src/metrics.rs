//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Sync driver (catalog and channel-stats passes, rows touched)
//! - External services (Sonarr, Notion, YouTube)
//! - Catalog cache (refreshes, webhook events)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Sync driver metrics
// =============================================================================

/// Sync passes total by dataset and result.
pub static SYNC_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tellysync_sync_runs_total", "Total sync passes"),
        &["dataset", "result"], // dataset: "catalog", "channel_stats"; result: "success", "failed"
    )
    .unwrap()
});

/// Sync pass duration in seconds.
pub static SYNC_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tellysync_sync_duration_seconds",
            "Duration of sync passes",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["dataset"],
    )
    .unwrap()
});

/// Remote rows upserted total.
pub static ROWS_UPSERTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tellysync_rows_upserted_total",
        "Total remote rows created or updated",
    )
    .unwrap()
});

/// Remote rows archived total.
pub static ROWS_DELETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tellysync_rows_deleted_total",
        "Total remote rows archived",
    )
    .unwrap()
});

/// Calendar entries skipped because their series was missing.
pub static ENTRIES_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tellysync_calendar_entries_skipped_total",
        "Calendar entries skipped during catalog sync",
    )
    .unwrap()
});

// =============================================================================
// External service metrics
// =============================================================================

/// External service requests total.
pub static EXTERNAL_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tellysync_external_requests_total",
            "Total external service requests",
        ),
        &["service", "status"], // service: "sonarr", "notion", "youtube"; status: "success", "error"
    )
    .unwrap()
});

/// Rate-limit retries against the tabular store.
pub static RATE_LIMIT_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tellysync_rate_limit_retries_total",
        "Total retries triggered by rate-limit responses",
    )
    .unwrap()
});

// =============================================================================
// Catalog cache metrics
// =============================================================================

/// Full catalog refreshes.
pub static CACHE_REFRESHES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tellysync_cache_refreshes_total",
        "Total full catalog cache refreshes",
    )
    .unwrap()
});

/// Webhook events received by type.
pub static WEBHOOK_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tellysync_webhook_events_total", "Total webhook events"),
        &["event_type"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SYNC_RUNS.clone()),
        Box::new(SYNC_DURATION.clone()),
        Box::new(ROWS_UPSERTED.clone()),
        Box::new(ROWS_DELETED.clone()),
        Box::new(ENTRIES_SKIPPED.clone()),
        Box::new(EXTERNAL_REQUESTS.clone()),
        Box::new(RATE_LIMIT_RETRIES.clone()),
        Box::new(CACHE_REFRESHES.clone()),
        Box::new(WEBHOOK_EVENTS.clone()),
    ]
}
