use crate::domain::model::{CleanTable, LoadReport, ObjectLocation, Table, WriteMode};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Object store holding the raw CSV files.
pub trait Storage: Send + Sync {
    fn read_file(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    /// Keys in `bucket` starting with `prefix`, sorted.
    fn list_keys(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

/// Relational table sink. Each call opens and closes its own connection.
pub trait Sink: Send + Sync {
    /// Writes every row of `data` into `table` in one transaction and returns the
    /// number of rows written.
    fn write_table(
        &self,
        table: &str,
        data: &CleanTable,
        mode: WriteMode,
    ) -> impl std::future::Future<Output = Result<usize>> + Send;

    fn read_sample(
        &self,
        table: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Table>> + Send;

    fn row_count(&self, table: &str) -> impl std::future::Future<Output = Result<usize>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self, location: &ObjectLocation) -> Result<Table>;
    async fn transform(&self, data: Table) -> Result<CleanTable>;
    async fn load(&self, data: CleanTable) -> Result<LoadReport>;
}
