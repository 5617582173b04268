//! Sync orchestrator implementation.
//!
//! Drives the two dashboard datasets:
//! - Catalog sync: delete rows dated before the window, then upsert one row
//!   per calendar entry keyed by (Episode ID, Date). Filter-based upsert
//!   keeps unrelated columns and avoids the empty-table flicker of a
//!   rewrite.
//! - Channel-stats sync: clear the single-row table and insert one fresh
//!   row. The table has no natural key, so clear-and-rewrite is the diff.
//!
//! A pass that fails is logged and not retried within the cycle; the next
//! scheduled tick is the retry mechanism.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Map, Value};
use tokio::sync::{broadcast, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::metrics::{ENTRIES_SKIPPED, SYNC_DURATION, SYNC_RUNS};
use crate::notion::{
    format_property, NotionError, PropertyFilter, PropertyKind, TableDirectory, TableSync,
    TabularStore,
};
use crate::sonarr::{CalendarEntry, Series, SeriesCatalog};
use crate::youtube::{ChannelMetrics, ChannelStats};

use super::types::{CatalogSyncOutcome, StatsSyncOutcome, SyncError, SyncStatus};

/// The periodic sync driver.
pub struct SyncOrchestrator {
    config: SyncConfig,
    channel: String,
    catalog: Arc<dyn SeriesCatalog>,
    metrics_api: Arc<dyn ChannelMetrics>,
    sync: TableSync,
    tables: Arc<TableDirectory>,

    // Runtime state
    running: Arc<AtomicBool>,
    channel_id: RwLock<Option<String>>,
    last_catalog_sync: Arc<RwLock<Option<DateTime<Utc>>>>,
    last_stats_sync: Arc<RwLock<Option<DateTime<Utc>>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl SyncOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: SyncConfig,
        channel: String,
        catalog: Arc<dyn SeriesCatalog>,
        metrics_api: Arc<dyn ChannelMetrics>,
        store: Arc<dyn TabularStore>,
        tables: Arc<TableDirectory>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            channel,
            catalog,
            metrics_api,
            sync: TableSync::new(store),
            tables,
            running: Arc::new(AtomicBool::new(false)),
            channel_id: RwLock::new(None),
            last_catalog_sync: Arc::new(RwLock::new(None)),
            last_stats_sync: Arc::new(RwLock::new(None)),
            shutdown_tx,
        }
    }

    /// Start the orchestrator (spawns the two scheduled loops).
    pub async fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Sync orchestrator already running");
            return;
        }

        info!("Starting sync orchestrator");
        Self::spawn_sync_loop(
            &self,
            "catalog",
            Duration::from_secs(self.config.catalog_interval_hours * 3600),
            |orchestrator| async move {
                orchestrator.run_catalog_sync().await.map(|_| ())
            },
        );
        Self::spawn_sync_loop(
            &self,
            "channel-stats",
            Duration::from_secs(self.config.stats_interval_mins * 60),
            |orchestrator| async move { orchestrator.run_stats_sync().await.map(|_| ()) },
        );
        info!("Sync orchestrator started");
    }

    /// Stop the orchestrator gracefully.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Sync orchestrator not running");
            return;
        }

        info!("Stopping sync orchestrator");
        let _ = self.shutdown_tx.send(());

        // Give loops a moment to notice the shutdown
        tokio::time::sleep(Duration::from_millis(100)).await;
        info!("Sync orchestrator stopped");
    }

    /// Current driver status.
    pub async fn status(&self) -> SyncStatus {
        SyncStatus {
            running: self.running.load(Ordering::Relaxed),
            last_catalog_sync: *self.last_catalog_sync.read().await,
            last_stats_sync: *self.last_stats_sync.read().await,
        }
    }

    fn spawn_sync_loop<F, Fut>(
        orchestrator: &Arc<Self>,
        name: &'static str,
        period: Duration,
        pass: F,
    ) where
        F: Fn(Arc<SyncOrchestrator>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<(), SyncError>> + Send,
    {
        let mut shutdown_rx = orchestrator.shutdown_tx.subscribe();
        let orchestrator = Arc::clone(orchestrator);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut first = true;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if first {
                            first = false;
                            if !orchestrator.config.run_on_startup {
                                continue;
                            }
                        }
                        if let Err(e) = pass(Arc::clone(&orchestrator)).await {
                            error!("{} sync failed: {}", name, e);
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("{} sync loop shutting down", name);
                        break;
                    }
                }
            }
        });
    }

    /// One full catalog reconciliation pass.
    pub async fn run_catalog_sync(&self) -> Result<CatalogSyncOutcome, SyncError> {
        info!("Running catalog sync");
        let timer = SYNC_DURATION.with_label_values(&["catalog"]).start_timer();
        let result = self.catalog_sync_pass().await;
        timer.observe_duration();

        match &result {
            Ok(outcome) => {
                SYNC_RUNS.with_label_values(&["catalog", "success"]).inc();
                *self.last_catalog_sync.write().await = Some(Utc::now());
                info!(
                    "Catalog sync done: {} entries, {} upserted, {} deleted, {} skipped",
                    outcome.entries,
                    outcome.rows_upserted,
                    outcome.rows_deleted,
                    outcome.entries_skipped
                );
            }
            Err(e) => {
                SYNC_RUNS.with_label_values(&["catalog", "failed"]).inc();
                error!("Catalog sync failed: {}", e);
            }
        }
        result
    }

    async fn catalog_sync_pass(&self) -> Result<CatalogSyncOutcome, SyncError> {
        let table_id = self.table_id(&self.config.calendar_table).await?;

        let today = Utc::now().date_naive();
        let window_start = today - chrono::Duration::days(self.config.calendar_past_days);

        // Rows older than the window will never be touched by an upsert
        // again; drop them first so the table mirrors the window.
        let rows_deleted = self
            .sync
            .delete_rows_where(
                &table_id,
                Some(&PropertyFilter::date_before("Date", window_start)),
            )
            .await?;

        let entries = self
            .catalog
            .get_episodes_calendar(
                self.config.calendar_past_days,
                self.config.calendar_future_days,
            )
            .await?;

        let mut outcome = CatalogSyncOutcome {
            entries: entries.len(),
            rows_deleted,
            ..Default::default()
        };

        for entry in entries {
            let Some(air_date) = entry.air_date else {
                warn!(
                    "Calendar entry {} has no air date, skipping",
                    entry.id
                );
                outcome.entries_skipped += 1;
                ENTRIES_SKIPPED.inc();
                continue;
            };

            // A dangling series reference must not abort the whole batch.
            let series = match self.catalog.get_series_by_id(entry.series_id).await {
                Ok(Some(series)) => series,
                Ok(None) => {
                    warn!(
                        "Calendar entry {} references unknown series {}, skipping",
                        entry.id, entry.series_id
                    );
                    outcome.entries_skipped += 1;
                    ENTRIES_SKIPPED.inc();
                    continue;
                }
                Err(e) => {
                    warn!(
                        "Failed to resolve series {} for calendar entry {}: {}",
                        entry.series_id, entry.id, e
                    );
                    outcome.entries_skipped += 1;
                    ENTRIES_SKIPPED.inc();
                    continue;
                }
            };

            let properties = match calendar_row_properties(&series, &entry, air_date) {
                Ok(properties) => properties,
                Err(e) => {
                    warn!("Failed to format row for episode {}: {}", entry.id, e);
                    outcome.entries_skipped += 1;
                    continue;
                }
            };

            let match_filter = PropertyFilter::and(vec![
                PropertyFilter::number_equals("Episode ID", entry.id as f64),
                PropertyFilter::date_equals("Date", air_date),
            ]);

            match self
                .sync
                .upsert_row(&table_id, &properties, Some(&match_filter))
                .await
            {
                Ok(_) => outcome.rows_upserted += 1,
                Err(e) => {
                    warn!("Failed to upsert row for episode {}: {}", entry.id, e);
                }
            }
        }

        Ok(outcome)
    }

    /// One channel-stats rewrite pass.
    pub async fn run_stats_sync(&self) -> Result<StatsSyncOutcome, SyncError> {
        info!("Running channel-stats sync");
        let timer = SYNC_DURATION
            .with_label_values(&["channel_stats"])
            .start_timer();
        let result = self.stats_sync_pass().await;
        timer.observe_duration();

        match &result {
            Ok(outcome) => {
                SYNC_RUNS
                    .with_label_values(&["channel_stats", "success"])
                    .inc();
                *self.last_stats_sync.write().await = Some(Utc::now());
                info!(
                    "Channel-stats sync done: {} subscribers, {} views, {} videos",
                    outcome.subscriber_count, outcome.view_count, outcome.video_count
                );
            }
            Err(e) => {
                SYNC_RUNS
                    .with_label_values(&["channel_stats", "failed"])
                    .inc();
                error!("Channel-stats sync failed: {}", e);
            }
        }
        result
    }

    async fn stats_sync_pass(&self) -> Result<StatsSyncOutcome, SyncError> {
        let table_id = self.table_id(&self.config.stats_table).await?;
        let channel_id = self.resolve_channel_id().await?;
        let stats = self.metrics_api.get_channel_stats(&channel_id).await?;

        // Exactly one row ever exists; no natural key to diff against.
        let rows_cleared = self.sync.clear_table(&table_id).await?;
        let properties = stats_row_properties(&stats)?;
        self.sync.upsert_row(&table_id, &properties, None).await?;

        Ok(StatsSyncOutcome {
            rows_cleared,
            subscriber_count: stats.subscriber_count,
            view_count: stats.view_count,
            video_count: stats.video_count,
        })
    }

    /// Directory lookup with a one-shot warm-up when not yet resolved.
    async fn table_id(&self, name: &str) -> Result<String, SyncError> {
        match self.tables.table_id(name).await {
            Ok(id) => Ok(id),
            Err(NotionError::NotResolved) => {
                self.tables.resolve().await?;
                Ok(self.tables.table_id(name).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The configured channel reference is resolved once and reused.
    async fn resolve_channel_id(&self) -> Result<String, SyncError> {
        if let Some(id) = self.channel_id.read().await.clone() {
            return Ok(id);
        }
        let id = self.metrics_api.resolve_channel_id(&self.channel).await?;
        info!("Resolved channel {} to id {}", self.channel, id);
        *self.channel_id.write().await = Some(id.clone());
        Ok(id)
    }
}

/// Row properties for one calendar entry.
fn calendar_row_properties(
    series: &Series,
    entry: &CalendarEntry,
    air_date: NaiveDate,
) -> Result<Map<String, Value>, NotionError> {
    let episode_title = entry.title.as_deref().unwrap_or("Unknown Episode");
    let summary = format!(
        "{} - S{}E{}: {}",
        series.title, entry.season_number, entry.episode_number, episode_title
    );

    let mut properties = Map::new();
    properties.insert(
        "Name".to_string(),
        format_property(&PropertyKind::Title, &json!(series.title))?,
    );
    properties.insert(
        "Show Title".to_string(),
        format_property(&PropertyKind::RichText, &json!(summary))?,
    );
    properties.insert(
        "Date".to_string(),
        format_property(
            &PropertyKind::Date,
            &json!(air_date.format("%Y-%m-%d").to_string()),
        )?,
    );
    properties.insert(
        "Episode ID".to_string(),
        format_property(&PropertyKind::Number, &json!(entry.id))?,
    );
    Ok(properties)
}

/// Row properties for one channel-stats snapshot.
fn stats_row_properties(stats: &ChannelStats) -> Result<Map<String, Value>, NotionError> {
    let mut properties = Map::new();
    properties.insert(
        "Name".to_string(),
        format_property(&PropertyKind::Title, &json!(stats.title))?,
    );
    properties.insert(
        "Subscribers".to_string(),
        format_property(&PropertyKind::Number, &json!(stats.subscriber_count))?,
    );
    properties.insert(
        "Views".to_string(),
        format_property(&PropertyKind::Number, &json!(stats.view_count))?,
    );
    properties.insert(
        "Videos".to_string(),
        format_property(&PropertyKind::Number, &json!(stats.video_count))?,
    );
    properties.insert(
        "Updated".to_string(),
        format_property(&PropertyKind::Date, &json!(Utc::now().to_rfc3339()))?,
    );
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_row_properties_shape() {
        let series = Series::new(10, "Show A");
        let entry = CalendarEntry {
            id: 501,
            series_id: 10,
            season_number: 2,
            episode_number: 5,
            title: Some("The One".to_string()),
            air_date: None,
        };
        let air_date = NaiveDate::from_ymd_opt(2024, 12, 3).unwrap();

        let properties = calendar_row_properties(&series, &entry, air_date).unwrap();

        assert_eq!(properties["Name"]["title"][0]["text"]["content"], "Show A");
        let summary = properties["Show Title"]["rich_text"][0]["text"]["content"]
            .as_str()
            .unwrap();
        assert!(summary.contains("S2E5"));
        assert!(summary.contains("The One"));
        assert_eq!(properties["Date"]["date"]["start"], "2024-12-03");
        assert_eq!(properties["Episode ID"]["number"], 501.0);
    }

    #[test]
    fn test_stats_row_properties_shape() {
        let stats = ChannelStats {
            title: "My Channel".to_string(),
            subscriber_count: 100,
            view_count: 5000,
            video_count: 20,
            published_at: None,
        };

        let properties = stats_row_properties(&stats).unwrap();

        assert_eq!(properties["Subscribers"]["number"], 100.0);
        assert_eq!(properties["Views"]["number"], 5000.0);
        assert_eq!(properties["Videos"]["number"], 20.0);
        assert!(properties["Updated"]["date"]["start"].as_str().is_some());
    }
}
