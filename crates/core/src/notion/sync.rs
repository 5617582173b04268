//! Filter-based table synchronization engine.
//!
//! Computes create/update/delete operations against a remote table using
//! natural-key match filters. Filter-based upsert is preferred over
//! clear-and-rewrite wherever a natural key exists: a rewrite leaves the
//! table visibly empty mid-pass and loses manual edits to unrelated
//! columns. `clear_table` remains for datasets with no natural key.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::metrics::{ROWS_DELETED, ROWS_UPSERTED};

use super::types::{Page, PropertyFilter};
use super::{NotionError, TabularStore};

/// Create/update/delete engine over a [`TabularStore`].
pub struct TableSync {
    store: Arc<dyn TabularStore>,
}

impl TableSync {
    pub fn new(store: Arc<dyn TabularStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TabularStore> {
        &self.store
    }

    /// Create or update one row.
    ///
    /// With a match filter: the first matching row is updated in place
    /// (its id is preserved); with no match, a new row is created. More
    /// than one match means the natural key is imperfect upstream; the
    /// first match is updated and the condition is logged. With no filter,
    /// a row is always created.
    pub async fn upsert_row(
        &self,
        table_id: &str,
        properties: &Map<String, Value>,
        match_filter: Option<&PropertyFilter>,
    ) -> Result<Page, NotionError> {
        if let Some(filter) = match_filter {
            let response = self.store.query_rows(table_id, Some(filter), None).await?;
            if let Some(first) = response.results.first() {
                if response.results.len() > 1 || response.has_more {
                    warn!(
                        "Match filter hit {} rows in table {}, updating the first ({})",
                        response.results.len(),
                        table_id,
                        first.id
                    );
                }
                debug!("Updating row {} in table {}", first.id, table_id);
                let page = self.store.update_row(&first.id, properties).await?;
                ROWS_UPSERTED.inc();
                return Ok(page);
            }
        }

        debug!("Creating new row in table {}", table_id);
        let page = self.store.create_row(table_id, properties).await?;
        ROWS_UPSERTED.inc();
        Ok(page)
    }

    /// Archive every row matching the filter, paging through the result
    /// cursor until exhausted. A row that fails to archive is logged and
    /// skipped; the batch continues. Returns the number archived.
    pub async fn delete_rows_where(
        &self,
        table_id: &str,
        filter: Option<&PropertyFilter>,
    ) -> Result<u64, NotionError> {
        let mut deleted: u64 = 0;
        let mut cursor: Option<String> = None;

        loop {
            let response = self
                .store
                .query_rows(table_id, filter, cursor.as_deref())
                .await?;

            for page in &response.results {
                match self.store.archive_row(&page.id).await {
                    Ok(()) => {
                        deleted += 1;
                        ROWS_DELETED.inc();
                    }
                    Err(e) => warn!("Failed to delete page {}: {}", page.id, e),
                }
            }

            if !response.has_more {
                break;
            }
            cursor = response.next_cursor;
            if cursor.is_none() {
                break;
            }
        }

        debug!("Deleted {} rows from table {}", deleted, table_id);
        Ok(deleted)
    }

    /// Delete every row in the table. Used before a full rewrite when no
    /// stable match key exists for diffing.
    pub async fn clear_table(&self, table_id: &str) -> Result<u64, NotionError> {
        self.delete_rows_where(table_id, None).await
    }
}
