//! Property formatting for the tabular store.
//!
//! Each column has a declared type and a single formatting rule mapping a
//! raw value to the store's expected shape. Unsupported types and
//! value/type mismatches fail here, before any network call is attempted.

use serde_json::{json, Value};

use super::NotionError;

/// Declared column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    Select,
    MultiSelect,
    Number,
    Checkbox,
    Date,
    Url,
    Files,
    /// Anything the formatter has no rule for (rollup, formula, people, …).
    Other(String),
}

impl PropertyKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "title" => Self::Title,
            "rich_text" => Self::RichText,
            "select" => Self::Select,
            "multi_select" => Self::MultiSelect,
            "number" => Self::Number,
            "checkbox" => Self::Checkbox,
            "date" => Self::Date,
            "url" => Self::Url,
            "files" => Self::Files,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::Select => "select",
            Self::MultiSelect => "multi_select",
            Self::Number => "number",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
            Self::Url => "url",
            Self::Files => "files",
            Self::Other(name) => name,
        }
    }
}

/// Format a raw value according to its declared column type.
pub fn format_property(kind: &PropertyKind, value: &Value) -> Result<Value, NotionError> {
    match kind {
        PropertyKind::Title => {
            let text = value_as_text(kind, value)?;
            Ok(json!({"title": [{"text": {"content": text}}]}))
        }
        PropertyKind::RichText => {
            let text = value_as_text(kind, value)?;
            Ok(json!({"rich_text": [{"text": {"content": text}}]}))
        }
        PropertyKind::Select => {
            let name = value_as_text(kind, value)?;
            Ok(json!({"select": {"name": name}}))
        }
        PropertyKind::MultiSelect => {
            let names = value_as_text_list(kind, value)?;
            Ok(json!({
                "multi_select": names
                    .into_iter()
                    .map(|n| json!({"name": n}))
                    .collect::<Vec<_>>(),
            }))
        }
        PropertyKind::Number => {
            let number = value_as_number(kind, value)?;
            Ok(json!({"number": number}))
        }
        PropertyKind::Checkbox => match value.as_bool() {
            Some(b) => Ok(json!({"checkbox": b})),
            None => Err(invalid(kind, value)),
        },
        PropertyKind::Date => {
            let date = value_as_text(kind, value)?;
            Ok(json!({"date": {"start": date}}))
        }
        PropertyKind::Url => {
            let url = value_as_text(kind, value)?;
            Ok(json!({"url": url}))
        }
        PropertyKind::Files => {
            let urls = value_as_text_list(kind, value)?;
            Ok(json!({
                "files": urls
                    .into_iter()
                    .map(|url| {
                        let name = url.rsplit('/').next().unwrap_or(&url).to_string();
                        json!({"type": "external", "name": name, "external": {"url": url}})
                    })
                    .collect::<Vec<_>>(),
            }))
        }
        PropertyKind::Other(name) => Err(NotionError::UnsupportedProperty(name.clone())),
    }
}

fn value_as_text(kind: &PropertyKind, value: &Value) -> Result<String, NotionError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(invalid(kind, value)),
    }
}

fn value_as_text_list(kind: &PropertyKind, value: &Value) -> Result<Vec<String>, NotionError> {
    match value {
        Value::Array(items) => items.iter().map(|v| value_as_text(kind, v)).collect(),
        other => Ok(vec![value_as_text(kind, other)?]),
    }
}

fn value_as_number(kind: &PropertyKind, value: &Value) -> Result<f64, NotionError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid(kind, value)),
        Value::String(s) => s.parse::<f64>().map_err(|_| invalid(kind, value)),
        _ => Err(invalid(kind, value)),
    }
}

fn invalid(kind: &PropertyKind, value: &Value) -> NotionError {
    NotionError::InvalidValue {
        kind: kind.name().to_string(),
        message: format!("cannot format {}", value),
    }
}
