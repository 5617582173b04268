//! Notion API client.
//!
//! Every request goes through the [`RequestGate`]; a rate-limit response
//! sleeps for the server-specified duration (or an exponential backoff)
//! and retries up to a fixed ceiling before surfacing the error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::NotionConfig;
use crate::metrics::{EXTERNAL_REQUESTS, RATE_LIMIT_RETRIES};

use super::rate_limit::RequestGate;
use super::types::{ChildTable, Page, PropertyFilter, QueryResponse};
use super::{NotionError, TabularStore};

const DEFAULT_BASE_URL: &str = "https://api.notion.com";
const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;

/// Notion API client.
pub struct NotionClient {
    client: Client,
    base_url: String,
    token: String,
    gate: RequestGate,
    max_retries: u32,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Result<Self, NotionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            gate: RequestGate::new(
                config.max_in_flight,
                Duration::from_millis(config.min_request_interval_ms),
            ),
            max_retries: config.max_retries,
        })
    }

    /// Fetch a table definition by id.
    pub async fn get_table(&self, table_id: &str) -> Result<Value, NotionError> {
        self.request(Method::GET, &format!("/v1/databases/{}", table_id), None)
            .await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, NotionError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt: u32 = 0;

        loop {
            let _permit = self.gate.acquire().await;
            debug!("Notion {} {}", method, path);

            let mut request = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(&self.token)
                .header("Notion-Version", NOTION_VERSION);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await.inspect_err(|_| {
                EXTERNAL_REQUESTS
                    .with_label_values(&["notion", "error"])
                    .inc();
            })?;

            let status = response.status();
            if status == 429 {
                attempt += 1;
                RATE_LIMIT_RETRIES.inc();
                if attempt > self.max_retries {
                    EXTERNAL_REQUESTS
                        .with_label_values(&["notion", "error"])
                        .inc();
                    return Err(NotionError::RateLimited);
                }
                let delay = retry_after(&response)
                    .unwrap_or_else(|| Duration::from_secs(1u64 << (attempt - 1).min(5)));
                warn!(
                    "Notion rate limited, retrying in {:?} (attempt {}/{})",
                    delay, attempt, self.max_retries
                );
                drop(response);
                tokio::time::sleep(delay).await;
                continue;
            }
            if status == 404 {
                EXTERNAL_REQUESTS
                    .with_label_values(&["notion", "error"])
                    .inc();
                return Err(NotionError::NotFound(path.to_string()));
            }
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                EXTERNAL_REQUESTS
                    .with_label_values(&["notion", "error"])
                    .inc();
                return Err(NotionError::ApiError {
                    status: status.as_u16(),
                    message,
                });
            }

            EXTERNAL_REQUESTS
                .with_label_values(&["notion", "success"])
                .inc();
            return response
                .json::<Value>()
                .await
                .map_err(|e| NotionError::ParseError(format!("Failed to parse {}: {}", path, e)));
        }
    }
}

/// Server-specified retry delay, when present.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<f64>().ok())
        .map(Duration::from_secs_f64)
}

#[async_trait]
impl TabularStore for NotionClient {
    async fn query_rows(
        &self,
        table_id: &str,
        filter: Option<&PropertyFilter>,
        start_cursor: Option<&str>,
    ) -> Result<QueryResponse, NotionError> {
        let mut body = json!({"page_size": PAGE_SIZE});
        if let Some(filter) = filter {
            body["filter"] = filter.to_json();
        }
        if let Some(cursor) = start_cursor {
            body["start_cursor"] = json!(cursor);
        }

        let value = self
            .request(
                Method::POST,
                &format!("/v1/databases/{}/query", table_id),
                Some(&body),
            )
            .await?;

        serde_json::from_value(value)
            .map_err(|e| NotionError::ParseError(format!("Failed to parse query response: {}", e)))
    }

    async fn create_row(
        &self,
        table_id: &str,
        properties: &Map<String, Value>,
    ) -> Result<Page, NotionError> {
        let body = json!({
            "parent": {"database_id": table_id},
            "properties": properties,
        });

        let value = self.request(Method::POST, "/v1/pages", Some(&body)).await?;
        serde_json::from_value(value)
            .map_err(|e| NotionError::ParseError(format!("Failed to parse created page: {}", e)))
    }

    async fn update_row(
        &self,
        page_id: &str,
        properties: &Map<String, Value>,
    ) -> Result<Page, NotionError> {
        let body = json!({"properties": properties});

        let value = self
            .request(Method::PATCH, &format!("/v1/pages/{}", page_id), Some(&body))
            .await?;
        serde_json::from_value(value)
            .map_err(|e| NotionError::ParseError(format!("Failed to parse updated page: {}", e)))
    }

    async fn archive_row(&self, page_id: &str) -> Result<(), NotionError> {
        let body = json!({"archived": true});
        self.request(Method::PATCH, &format!("/v1/pages/{}", page_id), Some(&body))
            .await?;
        Ok(())
    }

    async fn list_child_tables(&self, page_id: &str) -> Result<Vec<ChildTable>, NotionError> {
        let mut tables = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let path = match &cursor {
                Some(cursor) => format!(
                    "/v1/blocks/{}/children?page_size={}&start_cursor={}",
                    page_id, PAGE_SIZE, cursor
                ),
                None => format!("/v1/blocks/{}/children?page_size={}", page_id, PAGE_SIZE),
            };
            let value = self.request(Method::GET, &path, None).await?;

            for block in value["results"].as_array().into_iter().flatten() {
                if block["type"] == "child_database" {
                    let id = block["id"].as_str().unwrap_or_default().to_string();
                    let title = block["child_database"]["title"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string();
                    debug!("Found child table: {} ({})", title, id);
                    tables.push(ChildTable { id, title });
                }
            }

            if !value["has_more"].as_bool().unwrap_or(false) {
                break;
            }
            cursor = value["next_cursor"].as_str().map(str::to_string);
            if cursor.is_none() {
                break;
            }
        }

        Ok(tables)
    }
}
