//! Record model
//!
//! A record is a versioned, identified document: a fixed header (identifier,
//! revision, type tag, timestamps, attachment stubs) plus an ordered mapping
//! of caller-defined fields.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::RecordId;
use super::revision::Revision;
use crate::error::{SaverError, SaverResult};

/// Ordered mapping of field names to JSON values
pub type Fields = Map<String, Value>;

/// Keys owned by the record header; callers cannot set them as fields
pub const RESERVED_KEYS: &[&str] = &["_id", "_rev", "_attachments", "doctype", "created", "modified"];

/// Metadata about one attachment stored alongside a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    /// MIME type of the payload
    pub content_type: String,
    /// Payload size in bytes
    pub length: u64,
}

/// A persisted document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier, generated once
    #[serde(rename = "_id")]
    pub id: RecordId,

    /// Revision token of the stored version, if the store maintains one
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<Revision>,

    /// Which logical entity kind this record represents
    pub doctype: String,

    /// When the record was created
    pub created: DateTime<Utc>,

    /// When the record was last committed
    pub modified: DateTime<Utc>,

    /// Attachment stubs keyed by filename
    #[serde(
        rename = "_attachments",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub attachments: BTreeMap<String, AttachmentInfo>,

    /// Caller-defined fields
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Create a new, unsaved record of the given type
    pub fn new(doctype: impl Into<String>) -> Self {
        let now = now();
        Self {
            id: RecordId::new(),
            rev: None,
            doctype: doctype.into(),
            created: now,
            modified: now,
            attachments: BTreeMap::new(),
            fields: Fields::new(),
        }
    }

    /// Get a field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Get a field value as a string slice
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Set a field value, returning the previous one
    ///
    /// Header keys such as `_id` or `modified` are rejected.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> SaverResult<Option<Value>> {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(SaverError::Validation(format!(
                "Field '{}' is maintained by the saver and cannot be set",
                key
            )));
        }
        if key.is_empty() {
            return Err(SaverError::Validation("Field name cannot be empty".into()));
        }
        Ok(self.fields.insert(key, value.into()))
    }

    /// Remove a field, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// The record content as a single mapping, as seen by the diff engine
    ///
    /// Contains the type tag, both timestamps and every field. The identifier,
    /// revision and attachment stubs are bookkeeping and are left out.
    pub fn to_document(&self) -> Fields {
        let mut doc = Fields::new();
        doc.insert("doctype".into(), Value::String(self.doctype.clone()));
        doc.insert("created".into(), Value::String(format_time(&self.created)));
        doc.insert("modified".into(), Value::String(format_time(&self.modified)));
        for (key, value) in &self.fields {
            doc.insert(key.clone(), value.clone());
        }
        doc
    }
}

/// Current time, truncated to millisecond precision
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// ISO 8601 timestamp with millisecond precision and a `Z` suffix
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_record() {
        let record = Record::new("user");
        assert_eq!(record.doctype, "user");
        assert_eq!(record.created, record.modified);
        assert!(record.rev.is_none());
        assert!(record.fields.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let mut record = Record::new("user");
        assert_eq!(record.set("name", "alice").unwrap(), None);
        assert_eq!(record.get_str("name"), Some("alice"));

        let previous = record.set("name", "bob").unwrap();
        assert_eq!(previous, Some(json!("alice")));
    }

    #[test]
    fn test_reserved_keys_rejected() {
        let mut record = Record::new("user");
        for key in RESERVED_KEYS {
            let err = record.set(*key, "x").unwrap_err();
            assert!(err.is_validation());
        }
        assert!(record.set("", "x").unwrap_err().is_validation());
    }

    #[test]
    fn test_to_document() {
        let mut record = Record::new("user");
        record.set("name", "alice").unwrap();

        let doc = record.to_document();
        assert_eq!(doc["doctype"], json!("user"));
        assert_eq!(doc["name"], json!("alice"));
        assert!(doc.contains_key("created"));
        assert!(doc.contains_key("modified"));
        assert!(!doc.contains_key("_id"));
    }

    #[test]
    fn test_serialization_flattens_fields() {
        let mut record = Record::new("user");
        record.set("name", "alice").unwrap();
        record.rev = Some(Revision::first());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["_id"], json!(record.id.to_string()));
        assert_eq!(value["name"], json!("alice"));
        assert!(value.get("_attachments").is_none());

        let restored: Record = serde_json::from_value(value).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_format_time() {
        let time = DateTime::parse_from_rfc3339("2024-03-01T12:30:45.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_time(&time), "2024-03-01T12:30:45.123Z");
    }
}
