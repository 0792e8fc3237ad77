use crate::config::LoadConfig;
use crate::domain::model::{CleanTable, LoadReport, WriteMode};
use crate::domain::ports::Sink;
use crate::utils::error::{EtlError, Result};
use std::time::Duration;

/// Writes a cleaned batch into the target table with an explicit write mode,
/// then reads the table back for the log.
pub struct Loader<K: Sink> {
    sink: K,
    table: String,
    mode: WriteMode,
    sample_rows: usize,
    timeout: Duration,
}

impl<K: Sink> Loader<K> {
    pub fn new(sink: K, settings: &LoadConfig, timeout: Duration) -> Self {
        Self {
            sink,
            table: settings.table.clone(),
            mode: settings.write_mode,
            sample_rows: settings.sample_rows,
            timeout,
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Only the write is bounded by the load timeout and can fail the load.
    pub async fn load(&self, data: &CleanTable) -> Result<LoadReport> {
        tracing::debug!(
            "Writing {} rows into {} ({})",
            data.len(),
            self.table,
            self.mode
        );
        let rows_written = tokio::time::timeout(
            self.timeout,
            self.sink.write_table(&self.table, data, self.mode),
        )
        .await
        .map_err(|_| {
            EtlError::connection(format!(
                "loading into {} timed out after {:?}",
                self.table, self.timeout
            ))
        })??;
        tracing::info!(
            "Uploaded {} rows into {} (mode {})",
            rows_written,
            self.table,
            self.mode
        );

        let total_rows = match tokio::time::timeout(self.timeout, self.confirm()).await {
            Ok(total_rows) => total_rows,
            Err(_) => {
                tracing::warn!(
                    "Read-back of {} timed out after {:?}",
                    self.table,
                    self.timeout
                );
                None
            }
        };

        Ok(LoadReport {
            table: self.table.clone(),
            mode: self.mode,
            rows_written,
            total_rows,
        })
    }

    /// Row count and sample read-back. Failures here only warn; the write has
    /// already been committed.
    async fn confirm(&self) -> Option<usize> {
        let total_rows = match self.sink.row_count(&self.table).await {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!("Could not count rows in {}: {}", self.table, e);
                None
            }
        };

        if self.sample_rows > 0 {
            match self.sink.read_sample(&self.table, self.sample_rows).await {
                Ok(sample) => tracing::info!(
                    "First {} rows of {}:\n{}",
                    sample.len(),
                    self.table,
                    sample.render_preview(self.sample_rows)
                ),
                Err(e) => tracing::warn!("Could not read back {}: {}", self.table, e),
            }
        }

        total_rows
    }
}
