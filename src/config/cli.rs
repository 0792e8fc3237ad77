use crate::config::EtlConfig;
use crate::domain::model::WriteMode;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Local runner for the transaction cleaning job.
///
/// Without `--config` the job reads the same environment variables as the
/// lambda; flags override either source.
#[derive(Debug, Clone, Parser)]
#[command(name = "transaction-etl")]
#[command(about = "Clean a dirty store transaction CSV and load it into a database table")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory that holds the buckets
    #[arg(long, default_value = ".")]
    pub storage_root: PathBuf,

    /// Bucket (a directory under the storage root)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Object key inside the bucket
    #[arg(long)]
    pub key: Option<String>,

    /// Treat the key as a prefix and load every object under it
    #[arg(long)]
    pub prefix: bool,

    /// SQLite database file
    #[arg(long)]
    pub database: Option<String>,

    /// Target table
    #[arg(long)]
    pub table: Option<String>,

    /// overwrite | append
    #[arg(long)]
    pub write_mode: Option<WriteMode>,

    /// Rows read back from the target table after the load
    #[arg(long)]
    pub sample_rows: Option<usize>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    pub fn to_etl_config(&self) -> Result<EtlConfig> {
        let mut config = match &self.config {
            Some(path) => {
                // 必填欄位可以只由命令列提供
                let mut overrides = Vec::new();
                if let Some(database) = &self.database {
                    overrides.push(("database.name", database.clone()));
                }
                if let Some(write_mode) = self.write_mode {
                    overrides.push(("load.write_mode", write_mode.to_string()));
                }
                EtlConfig::from_file_with_overrides(path, &overrides)?
            }
            None => {
                // 命令列參數優先於環境變數
                let write_mode = self.write_mode.map(|mode| mode.to_string());
                let database = self.database.clone();
                EtlConfig::from_lookup(|name| match name {
                    "WRITE_MODE" if write_mode.is_some() => write_mode.clone(),
                    "DATABASE_NAME" if database.is_some() => database.clone(),
                    _ => std::env::var(name).ok(),
                })?
            }
        };

        if let Some(bucket) = &self.bucket {
            config.source.bucket = Some(bucket.clone());
        }
        if let Some(key) = &self.key {
            config.source.key = Some(key.clone());
        }
        if self.prefix {
            config.source.match_prefix = true;
        }
        if let Some(database) = &self.database {
            config.database.name = database.clone();
        }
        if let Some(table) = &self.table {
            config.load.table = table.clone();
        }
        if let Some(write_mode) = self.write_mode {
            config.load.write_mode = write_mode;
        }
        if let Some(sample_rows) = self.sample_rows {
            config.load.sample_rows = sample_rows;
        }

        Ok(config)
    }
}
