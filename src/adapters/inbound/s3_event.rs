//! Inbound adapter for S3 upload notifications.
//!
//! The trigger delivers the standard S3 event document:
//! `{"Records":[{"s3":{"bucket":{"name":..},"object":{"key":..}}}]}`.
//! Object keys arrive form-encoded (`+` for space, `%XX` escapes) and are
//! decoded here so the rest of the crate only sees real keys.

use serde::Deserialize;
use thiserror::Error as ThisError;
use tracing::debug;

use crate::domain::models::NotificationRecord;

#[derive(ThisError, Debug)]
pub enum NotificationError {
    #[error("Malformed S3 event document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Record {index} has no s3 section (event source: {event_source})")]
    MissingS3Section { index: usize, event_source: String },

    #[error("Record {index} has an undecodable object key {key:?}: {message}")]
    InvalidKeyEncoding {
        index: usize,
        key: String,
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct S3Event {
    #[serde(rename = "Records", default)]
    records: Vec<S3EventRecord>,
}

#[derive(Debug, Deserialize)]
struct S3EventRecord {
    #[serde(rename = "eventSource", default)]
    event_source: Option<String>,
    #[serde(rename = "eventName", default)]
    event_name: Option<String>,
    s3: Option<S3Entity>,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: S3Bucket,
    object: S3Object,
}

#[derive(Debug, Deserialize)]
struct S3Bucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    key: String,
}

/// Decode an S3 event key: `+` is a space, then percent-escapes
pub fn decode_object_key(raw: &str) -> Result<String, std::string::FromUtf8Error> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map(|decoded| decoded.into_owned())
}

/// Parse an S3 notification document into records, in delivery order
pub fn parse_s3_event(json: &str) -> Result<Vec<NotificationRecord>, NotificationError> {
    let event: S3Event = serde_json::from_str(json)?;

    event
        .records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let Some(s3) = record.s3 else {
                return Err(NotificationError::MissingS3Section {
                    index,
                    event_source: record.event_source.unwrap_or_else(|| "unknown".to_string()),
                });
            };

            let key = decode_object_key(&s3.object.key).map_err(|e| {
                NotificationError::InvalidKeyEncoding {
                    index,
                    key: s3.object.key.clone(),
                    message: e.to_string(),
                }
            })?;

            debug!(
                index,
                event_name = record.event_name.as_deref().unwrap_or("unknown"),
                bucket = %s3.bucket.name,
                %key,
                "notification record"
            );

            Ok(NotificationRecord::new(s3.bucket.name, key))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plus_and_percent_escapes() {
        assert_eq!(
            decode_object_key("p/images/my+photo%281%29.jpg").unwrap(),
            "p/images/my photo(1).jpg"
        );
        assert_eq!(decode_object_key("a%2Bb.png").unwrap(), "a+b.png");
    }

    #[test]
    fn test_parse_single_record() {
        let json = r#"{
            "Records": [{
                "eventSource": "aws:s3",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": {"name": "hngry-original-images", "arn": "arn:aws:s3:::hngry-original-images"},
                    "object": {"key": "p/images/test/bbq.jpg", "size": 1024}
                }
            }]
        }"#;

        let records = parse_s3_event(json).unwrap();
        assert_eq!(
            records,
            vec![NotificationRecord::new("hngry-original-images", "p/images/test/bbq.jpg")]
        );
    }

    #[test]
    fn test_empty_document_has_no_records() {
        assert!(parse_s3_event("{}").unwrap().is_empty());
    }

    #[test]
    fn test_record_without_s3_section_is_rejected() {
        let json = r#"{"Records":[{"eventSource":"aws:sqs"}]}"#;
        let err = parse_s3_event(json).unwrap_err();
        assert!(matches!(
            err,
            NotificationError::MissingS3Section { index: 0, .. }
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            parse_s3_event("not json").unwrap_err(),
            NotificationError::Malformed(_)
        ));
    }
}
