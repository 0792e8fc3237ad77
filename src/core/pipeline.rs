use crate::config::EtlConfig;
use crate::core::loader::Loader;
use crate::core::table::parse_csv;
use crate::core::transform::clean_table;
use crate::core::{CleanTable, LoadReport, ObjectLocation, Pipeline, Sink, Storage, Table};
use crate::utils::error::{EtlError, Result};
use std::time::Duration;

/// Fetch → clean → load for the store transaction feed.
pub struct TransactionPipeline<S: Storage, K: Sink> {
    storage: S,
    loader: Loader<K>,
    match_prefix: bool,
    fetch_timeout: Duration,
}

impl<S: Storage, K: Sink> TransactionPipeline<S, K> {
    pub fn new(storage: S, sink: K, config: &EtlConfig) -> Self {
        Self {
            storage,
            loader: Loader::new(sink, &config.load, config.timeouts.load()),
            match_prefix: config.source.match_prefix,
            fetch_timeout: config.timeouts.fetch(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn loader(&self) -> &Loader<K> {
        &self.loader
    }

    async fn fetch(&self, location: &ObjectLocation) -> Result<Table> {
        if !self.match_prefix {
            let bytes = self.storage.read_file(&location.bucket, &location.key).await?;
            tracing::debug!("Fetched {} bytes from {}", bytes.len(), location);
            return parse_csv(&bytes);
        }

        let keys = self
            .storage
            .list_keys(&location.bucket, &location.key)
            .await?;
        if keys.is_empty() {
            return Err(EtlError::storage(
                &location.key,
                "no objects found under prefix",
            ));
        }

        tracing::info!("Loading {} objects under {}", keys.len(), location);
        let mut combined: Option<Table> = None;
        for key in &keys {
            let bytes = self.storage.read_file(&location.bucket, key).await?;
            let part = parse_csv(&bytes).map_err(|e| match e {
                EtlError::FormatError { message } => {
                    EtlError::format(format!("{}: {}", key, message))
                }
                other => other,
            })?;
            match combined.as_mut() {
                Some(table) => table.append(part)?,
                None => combined = Some(part),
            }
        }

        combined.ok_or_else(|| EtlError::storage(&location.key, "no objects found under prefix"))
    }
}

#[async_trait::async_trait]
impl<S: Storage, K: Sink> Pipeline for TransactionPipeline<S, K> {
    async fn extract(&self, location: &ObjectLocation) -> Result<Table> {
        tracing::info!("Loading {}", location);
        tokio::time::timeout(self.fetch_timeout, self.fetch(location))
            .await
            .map_err(|_| {
                EtlError::connection(format!(
                    "fetching {} timed out after {:?}",
                    location, self.fetch_timeout
                ))
            })?
    }

    async fn transform(&self, data: Table) -> Result<CleanTable> {
        clean_table(data)
    }

    async fn load(&self, data: CleanTable) -> Result<LoadReport> {
        self.loader.load(&data).await
    }
}
