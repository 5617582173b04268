//! Mock tabular store for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::notion::{ChildTable, NotionError, Page, PropertyFilter, QueryResponse, TabularStore};

#[derive(Default)]
struct MockStoreState {
    tables: HashMap<String, Vec<Page>>,
    child_tables: HashMap<String, Vec<ChildTable>>,
    fail_archive: HashSet<String>,
    next_error: Option<NotionError>,
    page_size: usize,
    next_id: u64,
    created: u64,
    updated: u64,
    archived: u64,
    queries: u64,
}

/// In-memory implementation of the [`TabularStore`] trait.
///
/// Provides controllable behavior for testing:
/// - Rows live in per-table vectors with id-anchored cursor pagination
/// - Filters are evaluated against the stored property JSON
/// - Tracks create/update/archive/query calls for assertions
/// - Individual rows can be poisoned to fail archiving
pub struct MockTabularStore {
    state: Arc<RwLock<MockStoreState>>,
}

impl Default for MockTabularStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTabularStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockStoreState {
                page_size: 100,
                ..Default::default()
            })),
        }
    }

    /// Shrink the query page size to force cursor pagination in tests.
    pub async fn set_page_size(&self, size: usize) {
        self.state.write().await.page_size = size.max(1);
    }

    /// Register a child table under a page for directory resolution.
    pub async fn add_child_table(&self, page_id: &str, title: &str, table_id: &str) {
        let mut state = self.state.write().await;
        state
            .child_tables
            .entry(page_id.to_string())
            .or_default()
            .push(ChildTable {
                id: table_id.to_string(),
                title: title.to_string(),
            });
    }

    /// Make archiving the given row fail with an API error.
    pub async fn fail_archive_for(&self, page_id: &str) {
        self.state
            .write()
            .await
            .fail_archive
            .insert(page_id.to_string());
    }

    /// Configure the next store call to fail with the given error.
    pub async fn set_next_error(&self, error: NotionError) {
        self.state.write().await.next_error = Some(error);
    }

    /// Active (non-archived) rows currently in a table.
    pub async fn rows(&self, table_id: &str) -> Vec<Page> {
        self.state
            .read()
            .await
            .tables
            .get(table_id)
            .map(|rows| rows.iter().filter(|p| !p.archived).cloned().collect())
            .unwrap_or_default()
    }

    pub async fn row_count(&self, table_id: &str) -> usize {
        self.rows(table_id).await.len()
    }

    pub async fn created_count(&self) -> u64 {
        self.state.read().await.created
    }

    pub async fn updated_count(&self) -> u64 {
        self.state.read().await.updated
    }

    pub async fn archived_count(&self) -> u64 {
        self.state.read().await.archived
    }

    pub async fn query_count(&self) -> u64 {
        self.state.read().await.queries
    }
}

/// Insertion sequence number encoded in mock page ids ("page-<n>").
fn page_seq(id: &str) -> u64 {
    id.rsplit('-').next().and_then(|s| s.parse().ok()).unwrap_or(0)
}

/// Evaluate a filter against a row's stored property JSON.
fn matches_filter(page: &Page, filter: &PropertyFilter) -> bool {
    match filter {
        PropertyFilter::TitleEquals { property, value } => page
            .properties
            .get(property)
            .and_then(|p| p["title"][0]["text"]["content"].as_str())
            .is_some_and(|v| v == value),
        PropertyFilter::TextEquals { property, value } => page
            .properties
            .get(property)
            .and_then(|p| p["rich_text"][0]["text"]["content"].as_str())
            .is_some_and(|v| v == value),
        PropertyFilter::NumberEquals { property, value } => page
            .properties
            .get(property)
            .and_then(|p| p["number"].as_f64())
            .is_some_and(|v| v == *value),
        PropertyFilter::DateEquals { property, value } => page
            .properties
            .get(property)
            .and_then(|p| p["date"]["start"].as_str())
            .is_some_and(|v| v == value.format("%Y-%m-%d").to_string()),
        PropertyFilter::DateBefore { property, value } => page
            .properties
            .get(property)
            .and_then(|p| p["date"]["start"].as_str())
            // ISO dates compare correctly as strings
            .is_some_and(|v| v < value.format("%Y-%m-%d").to_string().as_str()),
        PropertyFilter::And(clauses) => clauses.iter().all(|c| matches_filter(page, c)),
    }
}

#[async_trait]
impl TabularStore for MockTabularStore {
    async fn query_rows(
        &self,
        table_id: &str,
        filter: Option<&PropertyFilter>,
        start_cursor: Option<&str>,
    ) -> Result<QueryResponse, NotionError> {
        let mut state = self.state.write().await;
        state.queries += 1;
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }

        let matching: Vec<Page> = state
            .tables
            .get(table_id)
            .map(|rows| {
                rows.iter()
                    .filter(|p| !p.archived)
                    .filter(|p| filter.is_none_or(|f| matches_filter(p, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // The cursor anchors to a row id; resumption starts strictly after
        // it even when earlier rows have since been archived.
        let start = match start_cursor {
            Some(cursor) => {
                let cursor_seq = page_seq(cursor);
                matching
                    .iter()
                    .position(|p| page_seq(&p.id) > cursor_seq)
                    .unwrap_or(matching.len())
            }
            None => 0,
        };

        let page_size = state.page_size;
        let end = (start + page_size).min(matching.len());
        let results: Vec<Page> = matching[start..end].to_vec();
        let has_more = end < matching.len();
        let next_cursor = if has_more {
            results.last().map(|p| p.id.clone())
        } else {
            None
        };

        Ok(QueryResponse {
            results,
            has_more,
            next_cursor,
        })
    }

    async fn create_row(
        &self,
        table_id: &str,
        properties: &Map<String, Value>,
    ) -> Result<Page, NotionError> {
        let mut state = self.state.write().await;
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }

        state.next_id += 1;
        let page = Page {
            id: format!("page-{}", state.next_id),
            properties: properties.clone(),
            archived: false,
        };
        state
            .tables
            .entry(table_id.to_string())
            .or_default()
            .push(page.clone());
        state.created += 1;
        Ok(page)
    }

    async fn update_row(
        &self,
        page_id: &str,
        properties: &Map<String, Value>,
    ) -> Result<Page, NotionError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }

        for rows in state.tables.values_mut() {
            if let Some(page) = rows.iter_mut().find(|p| p.id == page_id) {
                page.properties = properties.clone();
                let updated = page.clone();
                state.updated += 1;
                return Ok(updated);
            }
        }
        Err(NotionError::NotFound(page_id.to_string()))
    }

    async fn archive_row(&self, page_id: &str) -> Result<(), NotionError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        if state.fail_archive.contains(page_id) {
            return Err(NotionError::ApiError {
                status: 500,
                message: format!("archive poisoned for {}", page_id),
            });
        }

        for rows in state.tables.values_mut() {
            if let Some(page) = rows.iter_mut().find(|p| p.id == page_id) {
                page.archived = true;
                state.archived += 1;
                return Ok(());
            }
        }
        Err(NotionError::NotFound(page_id.to_string()))
    }

    async fn list_child_tables(&self, page_id: &str) -> Result<Vec<ChildTable>, NotionError> {
        let mut state = self.state.write().await;
        if let Some(err) = state.next_error.take() {
            return Err(err);
        }
        Ok(state.child_tables.get(page_id).cloned().unwrap_or_default())
    }
}
