pub mod etl;
pub mod event;
pub mod loader;
pub mod pipeline;
pub mod table;
pub mod transform;

pub use crate::domain::model::{CleanTable, LoadReport, ObjectLocation, Table, WriteMode};
pub use crate::domain::ports::{Pipeline, Sink, Storage};
pub use crate::utils::error::Result;
