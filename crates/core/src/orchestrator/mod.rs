//! Periodic sync driver.
//!
//! Two independent scheduled operations, each idempotent and safe to
//! re-run: the catalog sync (daily) keeps the upcoming-episodes table
//! aligned with the calendar window, and the channel-stats sync (hourly)
//! rewrites the single-row stats table. Both also run once at startup.

mod runner;
mod types;

pub use runner::SyncOrchestrator;
pub use types::{CatalogSyncOutcome, StatsSyncOutcome, SyncError, SyncStatus};
