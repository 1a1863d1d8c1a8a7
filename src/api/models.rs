// API request/response models (DTOs)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ingest::IngestReport;
use crate::normalization::row::{RawRow, PRODUCERS, STUDIOS, TITLE, WINNER, YEAR};

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Some(Meta::now()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            meta: Some(Meta::now()),
        }
    }
}

/// Metadata included in all API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub version: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub report: IngestReport,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertResponse {
    pub message: String,
    pub records: usize,
}

/// Unwraps a JSON movie payload: either one object or an array of them.
pub fn payload_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        other => vec![other],
    }
}

/// Converts one JSON movie into a raw row, or `None` when it fails the
/// request contract: `winner` and `producers` must be strings, `title`,
/// `studios` and `year` must be present and non-empty.
pub fn movie_payload_row(item: &Value) -> Option<RawRow> {
    let obj = item.as_object()?;
    let winner = obj.get(WINNER)?.as_str()?;
    let producers = obj.get(PRODUCERS)?.as_str()?;

    let mut row = RawRow::new();
    for field in [TITLE, STUDIOS, YEAR] {
        row.insert(field, present_text(obj.get(field)?)?);
    }
    row.insert(PRODUCERS, producers);
    row.insert(WINNER, winner);
    Some(row)
}

fn present_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_numeric_and_textual_years() {
        let row = movie_payload_row(&json!({
            "title": "T", "studios": "S", "year": 1999, "producers": "A and B", "winner": ""
        }))
        .unwrap();
        assert_eq!(row.get(YEAR), Some("1999"));
        assert_eq!(row.get(WINNER), Some(""));

        let row = movie_payload_row(&json!({
            "title": "T", "studios": "S", "year": "2001", "producers": "A", "winner": "yes"
        }))
        .unwrap();
        assert_eq!(row.get(YEAR), Some("2001"));
    }

    #[test]
    fn rejects_payloads_breaking_the_contract() {
        let bad = [
            json!({"title": "T", "studios": "S", "year": 1999, "producers": "A", "winner": true}),
            json!({"title": "T", "studios": "S", "year": 1999, "producers": ["A"], "winner": "yes"}),
            json!({"title": "", "studios": "S", "year": 1999, "producers": "A", "winner": "yes"}),
            json!({"title": "T", "year": 1999, "producers": "A", "winner": "yes"}),
            json!({"title": "T", "studios": "S", "year": 0, "producers": "A", "winner": "yes"}),
            json!("not an object"),
        ];
        for item in &bad {
            assert!(movie_payload_row(item).is_none(), "{item} should be rejected");
        }
    }

    #[test]
    fn single_objects_and_arrays_both_become_lists() {
        assert_eq!(payload_items(json!({"a": 1})).len(), 1);
        assert_eq!(payload_items(json!([{"a": 1}, {"a": 2}])).len(), 2);
        assert!(payload_items(json!([])).is_empty());
    }
}
