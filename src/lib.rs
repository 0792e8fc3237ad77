pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "lambda")]
pub use adapters::s3::S3Storage;

pub use adapters::{local::LocalStorage, sqlite::SqliteSink};
pub use config::{lambda::LambdaConfig, EtlConfig};
pub use core::{
    etl::{EtlEngine, RunReport, Stage},
    pipeline::TransactionPipeline,
};
pub use domain::model::{CleanTable, LoadReport, ObjectLocation, Table, WriteMode};
pub use utils::error::{EtlError, Result};
