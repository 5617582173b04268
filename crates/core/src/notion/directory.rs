//! Name-based table lookup with an explicit warm-up phase.
//!
//! Table ids are discovered by listing the child tables of the configured
//! parent page. Discovery is a network call, so it happens only in
//! `resolve()`; the accessor is pure and fails with a clear error when
//! called before warming instead of hiding I/O behind the lookup.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::{NotionError, TabularStore};

/// Resolved name → id directory of the dashboard tables under one page.
pub struct TableDirectory {
    store: Arc<dyn TabularStore>,
    parent_page_id: String,
    tables: RwLock<Option<HashMap<String, String>>>,
}

impl TableDirectory {
    pub fn new(store: Arc<dyn TabularStore>, parent_page_id: impl Into<String>) -> Self {
        Self {
            store,
            parent_page_id: parent_page_id.into(),
            tables: RwLock::new(None),
        }
    }

    /// Discover the child tables of the parent page and populate the
    /// directory. Safe to call again to pick up newly created tables.
    pub async fn resolve(&self) -> Result<(), NotionError> {
        let children = self.store.list_child_tables(&self.parent_page_id).await?;
        let mapping: HashMap<String, String> = children
            .into_iter()
            .map(|table| (table.title, table.id))
            .collect();

        info!(
            "Resolved {} child tables under page {}",
            mapping.len(),
            self.parent_page_id
        );
        *self.tables.write().await = Some(mapping);
        Ok(())
    }

    /// Pure lookup. `NotResolved` before the first successful `resolve()`,
    /// `UnknownTable` when the page has no child table with that name.
    pub async fn table_id(&self, name: &str) -> Result<String, NotionError> {
        let tables = self.tables.read().await;
        let mapping = tables.as_ref().ok_or(NotionError::NotResolved)?;
        mapping
            .get(name)
            .cloned()
            .ok_or_else(|| NotionError::UnknownTable(name.to_string()))
    }
}
