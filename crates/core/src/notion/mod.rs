//! Tabular store (Notion) integration.
//!
//! This module contains the page/row client with its rate-limit gate, the
//! property formatting layer, the two-phase table directory, and the
//! filter-based synchronization engine used by the periodic sync driver.

mod client;
mod directory;
mod properties;
mod rate_limit;
mod sync;
mod types;

pub use client::NotionClient;
pub use directory::TableDirectory;
pub use properties::{format_property, PropertyKind};
pub use rate_limit::RequestGate;
pub use sync::TableSync;
pub use types::*;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors that can occur when interacting with the tabular store.
#[derive(Debug, Error)]
pub enum NotionError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limited and the retry ceiling was exhausted.
    #[error("Rate limit exceeded after retries")]
    RateLimited,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Property type has no formatting rule.
    #[error("Unsupported property type: {0}")]
    UnsupportedProperty(String),

    /// Value does not fit the declared property type.
    #[error("Invalid value for {kind} property: {message}")]
    InvalidValue { kind: String, message: String },

    /// Table directory accessed before `resolve()` was called.
    #[error("Table directory not yet resolved")]
    NotResolved,

    /// No child table with the given name under the parent page.
    #[error("Unknown table: {0}")]
    UnknownTable(String),
}

/// Trait for tabular row stores.
///
/// Implemented by [`NotionClient`] and by the mock in `testing/`. The sync
/// engine and the table directory only ever talk to this seam.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// One page of rows matching the filter. Pass the previous response's
    /// `next_cursor` to continue.
    async fn query_rows(
        &self,
        table_id: &str,
        filter: Option<&PropertyFilter>,
        start_cursor: Option<&str>,
    ) -> Result<QueryResponse, NotionError>;

    /// Create a new row; returns the created page.
    async fn create_row(
        &self,
        table_id: &str,
        properties: &Map<String, Value>,
    ) -> Result<Page, NotionError>;

    /// Update an existing row in place; returns the updated page.
    async fn update_row(
        &self,
        page_id: &str,
        properties: &Map<String, Value>,
    ) -> Result<Page, NotionError>;

    /// Archive (soft-delete) a row.
    async fn archive_row(&self, page_id: &str) -> Result<(), NotionError>;

    /// Child tables directly under a page, for name-based table lookup.
    async fn list_child_tables(&self, page_id: &str) -> Result<Vec<ChildTable>, NotionError>;
}
