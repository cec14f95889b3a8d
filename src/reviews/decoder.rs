//! Review page wire format and decoding.

use serde::{Deserialize, Serialize};

use super::errors::DecodeError;

/// A single review as delivered by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Review body
    pub text: String,

    /// Creation time, kept as the provider formats it
    #[serde(rename = "created")]
    pub created_at: String,

    pub first_name: String,

    pub last_name: String,

    pub rating: i64,
}

/// One batch of reviews plus the total known to the server when it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "items")]
    pub records: Vec<ReviewRecord>,

    #[serde(rename = "count")]
    pub total_count: usize,
}

impl Page {
    /// Encode back into the wire format
    pub fn to_bytes(&self) -> Result<Vec<u8>, DecodeError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Decode a raw payload into a page.
///
/// A single malformed record fails the whole page.
pub fn decode(raw: &[u8]) -> Result<Page, DecodeError> {
    Ok(serde_json::from_slice(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "items": [
            {"text": "Great fit", "created": "13 января", "first_name": "Анна", "last_name": "Смирнова", "rating": 5},
            {"text": "Too small", "created": "2 февраля", "first_name": "Ivan", "last_name": "Petrov", "rating": 2, "avatar_url": null}
        ],
        "count": 45
    }"#;

    #[test]
    fn test_decode_page() {
        let page = decode(SAMPLE.as_bytes()).unwrap();
        assert_eq!(page.total_count, 45);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].first_name, "Анна");
        assert_eq!(page.records[0].created_at, "13 января");
        assert_eq!(page.records[1].rating, 2);
    }

    #[test]
    fn test_decode_empty_page() {
        let page = decode(br#"{"items": [], "count": 0}"#).unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.total_count, 0);
    }

    #[test]
    fn test_missing_field_fails_whole_page() {
        let raw = br#"{"items": [
            {"text": "ok", "created": "x", "first_name": "a", "last_name": "b", "rating": 4},
            {"text": "no rating", "created": "x", "first_name": "a", "last_name": "b"}
        ], "count": 2}"#;
        assert!(decode(raw).is_err());
    }

    #[test]
    fn test_wrong_type_and_truncated_payload() {
        let wrong_type = br#"{"items": [], "count": "many"}"#;
        assert!(decode(wrong_type).is_err());

        let truncated = &SAMPLE.as_bytes()[..SAMPLE.len() / 2];
        assert!(decode(truncated).is_err());
    }

    #[test]
    fn test_wire_format_is_preserved_on_encode() {
        let page = decode(SAMPLE.as_bytes()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&page.to_bytes().unwrap()).unwrap();
        assert_eq!(value["count"], 45);
        assert_eq!(value["items"][1]["last_name"], "Petrov");
        assert_eq!(value["items"][0]["created"], "13 января");
    }
}
