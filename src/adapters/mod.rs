// Adapters layer: concrete backends for the storage and sink ports.

pub mod local;
#[cfg(feature = "lambda")]
pub mod s3;
pub mod sqlite;
