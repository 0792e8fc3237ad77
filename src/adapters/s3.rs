use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::Client as S3Client;

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
}

impl S3Storage {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

impl Storage for S3Storage {
    async fn read_file(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        tracing::debug!("Fetching s3://{}/{}", bucket, key);

        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let message = match e.into_service_error() {
                    GetObjectError::NoSuchKey(_) => "object not found".to_string(),
                    err => format!(
                        "{}: {}",
                        err.code().unwrap_or("Unhandled"),
                        err.message().unwrap_or("failed to read from S3")
                    ),
                };
                EtlError::storage(key, message)
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| EtlError::storage(key, format!("failed to collect S3 data: {}", e)))?;

        Ok(data.into_bytes().to_vec())
    }

    async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                let err = e.into_service_error();
                EtlError::storage(
                    prefix,
                    format!(
                        "{}: {}",
                        err.code().unwrap_or("Unhandled"),
                        err.message().unwrap_or("failed to list objects")
                    ),
                )
            })?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|obj| obj.key())
                    // 目錄標記不是檔案
                    .filter(|key| !key.ends_with('/'))
                    .map(|key| key.to_string()),
            );
        }

        keys.sort();
        Ok(keys)
    }
}
