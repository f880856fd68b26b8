// Replication of delivered objects
//
// The delivery stream lands partitioned objects in the delivery bucket. Each
// object-created notification copies the new object into the destination
// bucket when its key sits under the partitioned prefix.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ProvisionError;

/// Object-created notification, reduced to the fields the copy needs
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectCreatedEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<NotificationRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    /// URL-encoded, with spaces as `+`
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRequest {
    pub source_bucket: String,
    pub source_key: String,
    pub destination_bucket: String,
    pub destination_key: String,
}

impl CopyRequest {
    /// `bucket/key` with every path segment percent-encoded
    pub fn copy_source(&self) -> String {
        std::iter::once(self.source_bucket.as_str())
            .chain(self.source_key.split('/'))
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Server-side object copy
#[async_trait]
pub trait ObjectCopier: Send + Sync {
    async fn copy_object(&self, request: &CopyRequest) -> Result<(), ProvisionError>;
}

#[derive(Debug, Clone)]
pub struct ReplicationConfig {
    pub source_prefix: String,
    pub destination_bucket: String,
}

impl ReplicationConfig {
    pub fn new(source_prefix: impl Into<String>, destination_bucket: impl Into<String>) -> Self {
        Self {
            source_prefix: source_prefix.into(),
            destination_bucket: destination_bucket.into(),
        }
    }

    /// Only partitioned objects (`{source_prefix}year=...`) are copied
    pub fn should_replicate(&self, key: &str) -> bool {
        key.strip_prefix(self.source_prefix.as_str())
            .is_some_and(|rest| rest.starts_with("year="))
    }
}

/// Decode a notification object key: `+` is a space, then percent escapes.
///
/// A literal plus arrives as `%2B` and survives. Malformed escapes are kept
/// verbatim; escapes that decode to invalid UTF-8 are rejected.
pub fn decode_object_key(raw: &str) -> Result<String, ProvisionError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|key| key.into_owned())
        .map_err(|err| {
            ProvisionError::InvalidInput(format!("object key '{}' is not valid UTF-8: {}", raw, err))
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationOutcome {
    Copied(CopyRequest),
    Skipped { key: String },
}

/// Copy the object named by the notification's first record.
///
/// Keys outside the partitioned prefix are skipped. A failed copy is
/// returned as an error so the invocation is retried.
pub async fn replicate_object<C: ObjectCopier + ?Sized>(
    copier: &C,
    config: &ReplicationConfig,
    event: &ObjectCreatedEvent,
) -> Result<ReplicationOutcome, ProvisionError> {
    let record = event
        .records
        .first()
        .ok_or_else(|| ProvisionError::InvalidInput("notification has no records".into()))?;

    let key = decode_object_key(&record.s3.object.key)?;
    if !config.should_replicate(&key) {
        debug!(
            key = %key,
            prefix = %config.source_prefix,
            "Key is not a partitioned object, skipping"
        );
        return Ok(ReplicationOutcome::Skipped { key });
    }

    let request = CopyRequest {
        source_bucket: record.s3.bucket.name.clone(),
        source_key: key.clone(),
        destination_bucket: config.destination_bucket.clone(),
        destination_key: key,
    };
    copier.copy_object(&request).await?;
    info!(
        source = %request.copy_source(),
        destination_bucket = %request.destination_bucket,
        "Object replicated"
    );

    Ok(ReplicationOutcome::Copied(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_object_key() {
        assert_eq!(
            decode_object_key("partitioned/year%3D2024/open+event+1.json").unwrap(),
            "partitioned/year=2024/open event 1.json"
        );
        assert_eq!(decode_object_key("a%2Bb+c").unwrap(), "a+b c");
        assert_eq!(decode_object_key("100%zz").unwrap(), "100%zz");
        assert!(matches!(
            decode_object_key("bad%FF"),
            Err(ProvisionError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_prefix_filter() {
        let config = ReplicationConfig::new("partitioned/", "replica-bucket");
        assert!(config.should_replicate("partitioned/year=2024/month=03/day=04/hour=11/obj"));
        assert!(!config.should_replicate("partitioned/errors/obj"));
        assert!(!config.should_replicate("raw/partitioned/year=2024/obj"));
        assert!(!config.should_replicate("year=2024/obj"));

        let unprefixed = ReplicationConfig::new("", "replica-bucket");
        assert!(unprefixed.should_replicate("year=2024/obj"));
    }

    #[test]
    fn test_copy_source_encoding() {
        let request = CopyRequest {
            source_bucket: "delivery".into(),
            source_key: "partitioned/year=2024/open event.json".into(),
            destination_bucket: "replica".into(),
            destination_key: "partitioned/year=2024/open event.json".into(),
        };
        assert_eq!(
            request.copy_source(),
            "delivery/partitioned/year%3D2024/open%20event.json"
        );
    }

    #[test]
    fn test_notification_parsing() {
        let event: ObjectCreatedEvent = serde_json::from_value(json!({
            "Records": [{
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": {"name": "delivery", "arn": "arn:aws:s3:::delivery"},
                    "object": {"key": "partitioned/year%3D2024/obj+1", "size": 1024}
                }
            }]
        }))
        .unwrap();
        assert_eq!(event.records[0].s3.bucket.name, "delivery");
        assert_eq!(event.records[0].s3.object.key, "partitioned/year%3D2024/obj+1");
    }
}
