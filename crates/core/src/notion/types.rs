//! Wire types for the tabular store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A row (page) in a remote table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub archived: bool,
}

/// One page of query results with the continuation cursor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A child table found under a parent page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildTable {
    pub id: String,
    pub title: String,
}

/// Row filter expression.
///
/// Covers what the sync passes need: equality on title/text/number/date
/// columns, date "before" for stale-row deletion, and and-combination.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyFilter {
    TitleEquals { property: String, value: String },
    TextEquals { property: String, value: String },
    NumberEquals { property: String, value: f64 },
    DateEquals { property: String, value: NaiveDate },
    DateBefore { property: String, value: NaiveDate },
    And(Vec<PropertyFilter>),
}

impl PropertyFilter {
    pub fn title_equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::TitleEquals {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn text_equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::TextEquals {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn number_equals(property: impl Into<String>, value: f64) -> Self {
        Self::NumberEquals {
            property: property.into(),
            value,
        }
    }

    pub fn date_equals(property: impl Into<String>, value: NaiveDate) -> Self {
        Self::DateEquals {
            property: property.into(),
            value,
        }
    }

    pub fn date_before(property: impl Into<String>, value: NaiveDate) -> Self {
        Self::DateBefore {
            property: property.into(),
            value,
        }
    }

    pub fn and(clauses: Vec<PropertyFilter>) -> Self {
        Self::And(clauses)
    }

    /// Render the remote store's filter JSON.
    pub fn to_json(&self) -> Value {
        match self {
            Self::TitleEquals { property, value } => json!({
                "property": property,
                "title": {"equals": value},
            }),
            Self::TextEquals { property, value } => json!({
                "property": property,
                "rich_text": {"equals": value},
            }),
            Self::NumberEquals { property, value } => json!({
                "property": property,
                "number": {"equals": value},
            }),
            Self::DateEquals { property, value } => json!({
                "property": property,
                "date": {"equals": value.format("%Y-%m-%d").to_string()},
            }),
            Self::DateBefore { property, value } => json!({
                "property": property,
                "date": {"before": value.format("%Y-%m-%d").to_string()},
            }),
            Self::And(clauses) => json!({
                "and": clauses.iter().map(|c| c.to_json()).collect::<Vec<_>>(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_filter_json() {
        let filter = PropertyFilter::number_equals("Episode ID", 501.0);
        assert_eq!(
            filter.to_json(),
            json!({"property": "Episode ID", "number": {"equals": 501.0}})
        );
    }

    #[test]
    fn test_date_before_filter_json() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 26).unwrap();
        let filter = PropertyFilter::date_before("Date", date);
        assert_eq!(
            filter.to_json(),
            json!({"property": "Date", "date": {"before": "2024-11-26"}})
        );
    }

    #[test]
    fn test_and_filter_json() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 3).unwrap();
        let filter = PropertyFilter::and(vec![
            PropertyFilter::number_equals("Episode ID", 501.0),
            PropertyFilter::date_equals("Date", date),
        ]);

        let json = filter.to_json();
        let clauses = json["and"].as_array().unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[1]["date"]["equals"], "2024-12-03");
    }

    #[test]
    fn test_query_response_defaults() {
        let response: QueryResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(!response.has_more);
        assert!(response.next_cursor.is_none());
    }

    #[test]
    fn test_page_deserialize() {
        let page: Page = serde_json::from_str(
            r#"{"id": "page-1", "properties": {"Name": {"title": []}}, "archived": false}"#,
        )
        .unwrap();
        assert_eq!(page.id, "page-1");
        assert!(page.properties.contains_key("Name"));
    }
}
