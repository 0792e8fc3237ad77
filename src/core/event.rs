use crate::domain::model::ObjectLocation;
use crate::utils::error::{EtlError, Result};
use serde::Deserialize;

/// S3 "object created" notification, reduced to the fields the job reads.
#[derive(Debug, Clone, Deserialize)]
pub struct S3EventNotification {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3EventRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub s3: Option<S3Entity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    #[serde(default)]
    pub bucket: Option<S3Bucket>,
    #[serde(default)]
    pub object: Option<S3Object>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl S3EventNotification {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| EtlError::format(format!("unrecognized trigger event: {}", e)))
    }

    /// Bucket and key of the first record. Only the first record is processed.
    pub fn object_location(&self) -> Result<ObjectLocation> {
        let record = self
            .records
            .first()
            .ok_or_else(|| EtlError::format("trigger event has no Records"))?;

        if self.records.len() > 1 {
            tracing::warn!(
                "Trigger event carries {} records, only the first is processed",
                self.records.len()
            );
        }

        let entity = record
            .s3
            .as_ref()
            .ok_or_else(|| EtlError::format("trigger event record has no s3 entity"))?;

        let bucket = entity
            .bucket
            .as_ref()
            .and_then(|b| b.name.as_deref())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| EtlError::format("trigger event is missing the bucket name"))?;

        let key = entity
            .object
            .as_ref()
            .and_then(|o| o.key.as_deref())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| EtlError::format("trigger event is missing the object key"))?;

        Ok(ObjectLocation::new(bucket, key))
    }
}

/// Parses a raw trigger payload straight into an object location.
pub fn parse_trigger(value: serde_json::Value) -> Result<ObjectLocation> {
    S3EventNotification::from_json(value)?.object_location()
}
