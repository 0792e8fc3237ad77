use crate::config::DatabaseConfig;
use crate::domain::model::{CleanTable, Table, WriteMode};
use crate::domain::ports::Sink;
use crate::utils::error::{EtlError, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags, TransactionBehavior};
use std::time::Duration;

/// Relational sink backed by a SQLite database file.
///
/// Every operation opens its own connection on the blocking pool, so nothing
/// is shared between invocations.
#[derive(Debug, Clone)]
pub struct SqliteSink {
    database: DatabaseConfig,
    busy_timeout: Duration,
}

impl SqliteSink {
    pub fn new(database: DatabaseConfig, busy_timeout: Duration) -> Self {
        Self {
            database,
            busy_timeout,
        }
    }

    async fn with_connection<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.database.name.clone();
        let busy_timeout = self.busy_timeout;
        let uri = self.database.redacted_uri();

        tokio::task::spawn_blocking(move || {
            let mut conn = open(&path, busy_timeout)?;
            tracing::debug!("Connected to {}", uri);
            work(&mut conn)
        })
        .await
        .map_err(|e| EtlError::connection(format!("database worker failed: {}", e)))?
    }
}

fn open(path: &str, busy_timeout: Duration) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| EtlError::connection(format!("cannot open database '{}': {}", path, e)))?;

    conn.busy_timeout(busy_timeout)
        .map_err(|e| EtlError::connection(format!("cannot configure connection: {}", e)))?;
    Ok(conn)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn write_rows(conn: &mut Connection, table: &str, data: &CleanTable, mode: WriteMode) -> Result<usize> {
    let write_err = |e: rusqlite::Error| EtlError::write(table, e.to_string());
    let quoted_table = quote_ident(table);
    let column_defs = data
        .columns()
        .iter()
        .map(|c| format!("{} TEXT", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");
    let column_list = data
        .columns()
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=data.columns().len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");

    // 整批在單一交易內完成，失敗時不留下部分資料。
    // IMMEDIATE 一開始就取得寫入鎖，併發寫入改為等待 busy timeout 而非立即失敗
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(write_err)?;

    match mode {
        WriteMode::Overwrite => {
            tx.execute_batch(&format!(
                "DROP TABLE IF EXISTS {t}; CREATE TABLE {t} ({defs});",
                t = quoted_table,
                defs = column_defs
            ))
            .map_err(write_err)?;
        }
        WriteMode::Append => {
            tx.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} ({});",
                quoted_table, column_defs
            ))
            .map_err(write_err)?;
        }
    }

    let mut written = 0;
    {
        let mut stmt = tx
            .prepare(&format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quoted_table, column_list, placeholders
            ))
            .map_err(write_err)?;
        for row in data.rows() {
            written += stmt.execute(params_from_iter(row.iter())).map_err(write_err)?;
        }
    }

    tx.commit().map_err(write_err)?;
    Ok(written)
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

impl Sink for SqliteSink {
    async fn write_table(&self, table: &str, data: &CleanTable, mode: WriteMode) -> Result<usize> {
        let table = table.to_string();
        let data = data.clone();
        self.with_connection(move |conn| write_rows(conn, &table, &data, mode))
            .await
    }

    async fn read_sample(&self, table: &str, limit: usize) -> Result<Table> {
        let table = table.to_string();
        self.with_connection(move |conn| {
            let read_err =
                |e: rusqlite::Error| EtlError::connection(format!("reading {}: {}", table, e));

            let mut stmt = conn
                .prepare(&format!("SELECT * FROM {} LIMIT ?1", quote_ident(&table)))
                .map_err(read_err)?;
            let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
            let width = columns.len();

            let mut sample = Table::new(columns);
            let mut rows = stmt.query([limit as i64]).map_err(read_err)?;
            while let Some(row) = rows.next().map_err(read_err)? {
                let mut cells = Vec::with_capacity(width);
                for idx in 0..width {
                    cells.push(value_to_string(row.get::<_, Value>(idx).map_err(read_err)?));
                }
                sample.push_row(cells)?;
            }
            Ok(sample)
        })
        .await
    }

    async fn row_count(&self, table: &str) -> Result<usize> {
        let table = table.to_string();
        self.with_connection(move |conn| {
            let count: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM {}", quote_ident(&table)),
                    [],
                    |row| row.get(0),
                )
                .map_err(|e| EtlError::connection(format!("counting {}: {}", table, e)))?;
            Ok(count as usize)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::clean_table;
    use crate::domain::model::REQUIRED_COLUMNS;
    use tempfile::TempDir;

    fn sink_at(path: &str) -> SqliteSink {
        SqliteSink::new(
            DatabaseConfig {
                driver: "sqlite".to_string(),
                host: None,
                port: None,
                username: None,
                password: None,
                name: path.to_string(),
            },
            Duration::from_secs(5),
        )
    }

    fn cleaned(rows: &[[&str; 6]]) -> CleanTable {
        let table = Table::from_rows(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap();
        clean_table(table).unwrap()
    }

    fn db_path(dir: &TempDir) -> String {
        dir.path().join("store.db").to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_overwrite_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let sink = sink_at(&db_path(&dir));

        let first = cleaned(&[
            ["Boston", "1", "1", "1", "1", "1"],
            ["Austin", "2", "2", "2", "2", "2"],
        ]);
        let second = cleaned(&[["Chicago, IL!", "PRD-007", "$19.99", "$10.00", "$2.50", "$17.49"]]);

        sink.write_table("clean_transaction", &first, WriteMode::Overwrite)
            .await
            .unwrap();
        let written = sink
            .write_table("clean_transaction", &second, WriteMode::Overwrite)
            .await
            .unwrap();

        assert_eq!(written, 1);
        assert_eq!(sink.row_count("clean_transaction").await.unwrap(), 1);
        let sample = sink.read_sample("clean_transaction", 5).await.unwrap();
        assert_eq!(sample.columns(), second.columns());
        assert_eq!(sample.rows(), second.rows());
    }

    #[tokio::test]
    async fn test_append_accumulates() {
        let dir = TempDir::new().unwrap();
        let sink = sink_at(&db_path(&dir));

        let first = cleaned(&[["Boston", "1", "1", "1", "1", "1"]]);
        let second = cleaned(&[
            ["Austin", "2", "2", "2", "2", "2"],
            ["Boston", "1", "1", "1", "1", "1"],
        ]);

        sink.write_table("clean_transaction", &first, WriteMode::Append)
            .await
            .unwrap();
        sink.write_table("clean_transaction", &second, WriteMode::Append)
            .await
            .unwrap();

        let mut stored = sink
            .read_sample("clean_transaction", 10)
            .await
            .unwrap()
            .rows()
            .to_vec();
        let mut expected: Vec<Vec<String>> = first.rows().to_vec();
        expected.extend(second.rows().iter().cloned());
        stored.sort();
        expected.sort();
        assert_eq!(stored, expected);
    }

    #[tokio::test]
    async fn test_leading_zeros_survive() {
        let dir = TempDir::new().unwrap();
        let sink = sink_at(&db_path(&dir));

        let data = cleaned(&[["X", "PRD-0042", "$0.99", "$0.50", "$0.00", "$0.49"]]);
        sink.write_table("clean_transaction", &data, WriteMode::Overwrite)
            .await
            .unwrap();

        let sample = sink.read_sample("clean_transaction", 1).await.unwrap();
        assert_eq!(sample.rows()[0][1], "0042");
        assert_eq!(sample.rows()[0][4], "000");
    }

    #[tokio::test]
    async fn test_append_schema_mismatch_is_write_error() {
        let dir = TempDir::new().unwrap();
        let path = db_path(&dir);
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE clean_transaction (STORE_LOCATION TEXT, PRODUCT_ID TEXT);
                 INSERT INTO clean_transaction VALUES ('Boston', '1');",
            )
            .unwrap();
        }
        let sink = sink_at(&path);

        let data = cleaned(&[["Austin", "2", "2", "2", "2", "2"]]);
        let result = sink
            .write_table("clean_transaction", &data, WriteMode::Append)
            .await;

        assert!(matches!(result, Err(EtlError::WriteError { .. })));
        assert_eq!(sink.row_count("clean_transaction").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_overwrite_keeps_previous_contents() {
        let dir = TempDir::new().unwrap();
        let sink = sink_at(&db_path(&dir));

        let previous = cleaned(&[
            ["Boston", "1", "1", "1", "1", "1"],
            ["Austin", "2", "2", "2", "2", "2"],
            ["Denver", "3", "3", "3", "3", "3"],
        ]);
        sink.write_table("clean_transaction", &previous, WriteMode::Overwrite)
            .await
            .unwrap();

        // SQLite 欄位名稱不分大小寫，CREATE TABLE 會在 DROP 之後失敗
        let mut columns: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.push("sp".to_string());
        let clashing = clean_table(
            Table::from_rows(
                columns,
                vec![["Chicago", "7", "7", "7", "7", "7", "7"]
                    .iter()
                    .map(|c| c.to_string())
                    .collect()],
            )
            .unwrap(),
        )
        .unwrap();

        let result = sink
            .write_table("clean_transaction", &clashing, WriteMode::Overwrite)
            .await;

        match result {
            Err(EtlError::WriteError { message, .. }) => {
                assert!(message.contains("duplicate column"), "{}", message)
            }
            other => panic!("expected WriteError, got {:?}", other),
        }
        assert_eq!(sink.row_count("clean_transaction").await.unwrap(), 3);
        let sample = sink.read_sample("clean_transaction", 5).await.unwrap();
        assert_eq!(sample.columns(), previous.columns());
        assert_eq!(sample.rows(), previous.rows());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_all_land() {
        let dir = TempDir::new().unwrap();
        let sink = sink_at(&db_path(&dir));

        let seed = cleaned(&[["Seed", "0", "0", "0", "0", "0"]]);
        sink.write_table("clean_transaction", &seed, WriteMode::Append)
            .await
            .unwrap();

        let batch: Vec<[&str; 6]> = (0..500).map(|_| ["A", "1", "1", "1", "1", "1"]).collect();
        let batch = cleaned(&batch);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sink = sink.clone();
                let batch = batch.clone();
                tokio::spawn(async move {
                    sink.write_table("clean_transaction", &batch, WriteMode::Append)
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 500);
        }
        assert_eq!(sink.row_count("clean_transaction").await.unwrap(), 1 + 8 * 500);
    }

    #[tokio::test]
    async fn test_unreachable_database_is_connection_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("store.db");
        let sink = sink_at(path.to_str().unwrap());

        let data = cleaned(&[["Austin", "2", "2", "2", "2", "2"]]);
        let result = sink
            .write_table("clean_transaction", &data, WriteMode::Overwrite)
            .await;

        assert!(matches!(result, Err(EtlError::ConnectionError { .. })));
    }

    #[tokio::test]
    async fn test_read_sample_respects_limit() {
        let dir = TempDir::new().unwrap();
        let sink = sink_at(&db_path(&dir));

        let rows: Vec<[&str; 6]> = (0..8).map(|_| ["A", "1", "1", "1", "1", "1"]).collect();
        sink.write_table("clean_transaction", &cleaned(&rows), WriteMode::Overwrite)
            .await
            .unwrap();

        let sample = sink.read_sample("clean_transaction", 5).await.unwrap();
        assert_eq!(sample.len(), 5);
        assert_eq!(sink.row_count("clean_transaction").await.unwrap(), 8);
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("SP"), "\"SP\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
