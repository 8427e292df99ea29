//! Object-store notification documents.
//!
//! An S3-style event carries a `Records` array; each record names the bucket
//! and the key of an object that was just written. Keys are taken verbatim.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use docingest_shared::{DocIngestError, Result};

/// One object named by an event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
    pub size: u64,
}

/// A record that could not be read as an [`ObjectRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Position in the `Records` array.
    pub index: usize,
    pub error: String,
}

/// The records of one event, split into usable objects and rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRecords {
    pub objects: Vec<ObjectRef>,
    pub rejected: Vec<RejectedRecord>,
}

#[derive(Deserialize)]
struct EventDocument {
    #[serde(rename = "Records", default)]
    records: Vec<Value>,
}

#[derive(Deserialize)]
struct RecordBody {
    s3: S3Entity,
}

#[derive(Deserialize)]
struct S3Entity {
    bucket: BucketEntity,
    object: ObjectEntity,
}

#[derive(Deserialize)]
struct BucketEntity {
    name: String,
}

#[derive(Deserialize)]
struct ObjectEntity {
    key: String,
    #[serde(default)]
    size: u64,
}

/// Parse a notification document.
///
/// The document itself must be a JSON object; a missing `Records` array means
/// no objects. A malformed record is rejected on its own and does not affect
/// its siblings.
pub fn parse_event(json: &str) -> Result<EventRecords> {
    let document: EventDocument = serde_json::from_str(json)
        .map_err(|e| DocIngestError::validation(format!("invalid event document: {e}")))?;

    let mut parsed = EventRecords::default();
    for (index, record) in document.records.into_iter().enumerate() {
        match serde_json::from_value::<RecordBody>(record) {
            Ok(body) => parsed.objects.push(ObjectRef {
                bucket: body.s3.bucket.name,
                key: body.s3.object.key,
                size: body.s3.object.size,
            }),
            Err(e) => {
                warn!(index, error = %e, "skipping malformed event record");
                parsed.rejected.push(RejectedRecord {
                    index,
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_in_order() {
        let json = r#"{
          "Records": [
            {"eventName": "ObjectCreated:Put",
             "s3": {"bucket": {"name": "docs"}, "object": {"key": "protected/plan/a.md", "size": 120}}},
            {"s3": {"bucket": {"name": "docs"}, "object": {"key": "protected/bom/b.md", "size": 7}}}
          ]
        }"#;

        let parsed = parse_event(json).unwrap();
        assert!(parsed.rejected.is_empty());
        assert_eq!(
            parsed.objects,
            vec![
                ObjectRef {
                    bucket: "docs".into(),
                    key: "protected/plan/a.md".into(),
                    size: 120
                },
                ObjectRef {
                    bucket: "docs".into(),
                    key: "protected/bom/b.md".into(),
                    size: 7
                },
            ]
        );
    }

    #[test]
    fn missing_records_is_empty() {
        assert_eq!(parse_event("{}").unwrap(), EventRecords::default());
    }

    #[test]
    fn keys_are_not_url_decoded() {
        let json = r#"{"Records":[{"s3":{"bucket":{"name":"b"},"object":{"key":"a+b%20c.md"}}}]}"#;
        let parsed = parse_event(json).unwrap();
        assert_eq!(parsed.objects[0].key, "a+b%20c.md");
        assert_eq!(parsed.objects[0].size, 0);
    }

    #[test]
    fn malformed_record_is_isolated() {
        let json = r#"{"Records":[
            {"s3":{"bucket":{"name":"b"}}},
            {"s3":{"bucket":{"name":"b"},"object":{"key":"ok.md","size":1}}}
        ]}"#;
        let parsed = parse_event(json).unwrap();
        assert_eq!(parsed.objects.len(), 1);
        assert_eq!(parsed.objects[0].key, "ok.md");
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].index, 0);
    }

    #[test]
    fn invalid_document_is_validation_error() {
        let err = parse_event("not json").unwrap_err();
        assert!(matches!(err, DocIngestError::Validation { .. }));
        assert!(parse_event("\"text\"").is_err());
    }
}
