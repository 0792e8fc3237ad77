use crate::core::event::parse_trigger;
use crate::core::{LoadReport, ObjectLocation, Pipeline};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Where an invocation is. Strictly linear; any failure aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Fetching,
    Cleaning,
    Loading,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetching",
            Stage::Cleaning => "cleaning",
            Stage::Loading => "loading",
            Stage::Done => "done",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub location: ObjectLocation,
    pub rows_fetched: usize,
    pub load: LoadReport,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Runs one invocation for a raw trigger event. A malformed event fails
    /// with `FormatError` before the pipeline is touched.
    pub async fn run_event(&self, event: serde_json::Value) -> Result<RunReport> {
        let location = parse_trigger(event).map_err(|e| {
            tracing::error!("❌ Rejected trigger event: {}", e);
            e
        })?;
        self.run(location).await
    }

    pub async fn run(&self, location: ObjectLocation) -> Result<RunReport> {
        let started_at = Utc::now();
        tracing::info!("Starting ETL for {}", location);

        let mut stage = Stage::Fetching;
        tracing::info!(stage = %stage, "Fetching {}", location);
        let raw = self
            .pipeline
            .extract(&location)
            .await
            .map_err(|e| fail(stage, &location, e))?;
        let rows_fetched = raw.len();
        tracing::info!("Fetched {} rows", rows_fetched);

        stage = Stage::Cleaning;
        tracing::info!(stage = %stage, "Cleaning {} rows", rows_fetched);
        let cleaned = self
            .pipeline
            .transform(raw)
            .await
            .map_err(|e| fail(stage, &location, e))?;

        stage = Stage::Loading;
        tracing::info!(stage = %stage, "Loading {} rows", cleaned.len());
        let load = self
            .pipeline
            .load(cleaned)
            .await
            .map_err(|e| fail(stage, &location, e))?;

        stage = Stage::Done;
        tracing::info!(
            stage = %stage,
            "✅ {} rows from {} loaded into {} ({})",
            load.rows_written,
            location,
            load.table,
            load.mode
        );

        Ok(RunReport {
            location,
            rows_fetched,
            load,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

fn fail(stage: Stage, location: &ObjectLocation, err: EtlError) -> EtlError {
    tracing::error!(
        stage = %stage,
        category = ?err.category(),
        "❌ ETL failed while {} {}: {}",
        stage,
        location,
        err
    );
    err
}
