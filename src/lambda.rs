use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Serialize;
use transaction_etl::utils::{logger, validation::Validate};
use transaction_etl::{
    EtlEngine, LambdaConfig, S3Storage, SqliteSink, TransactionPipeline, WriteMode,
};

type Engine = EtlEngine<TransactionPipeline<S3Storage, SqliteSink>>;

#[derive(Serialize)]
pub struct Response {
    pub message: String,
    pub bucket: String,
    pub key: String,
    pub table: String,
    pub write_mode: WriteMode,
    pub rows_loaded: usize,
    pub total_rows: Option<usize>,
}

async fn function_handler(engine: &Engine, event: LambdaEvent<serde_json::Value>) -> Result<Response, Error> {
    tracing::info!("Starting ETL Lambda function (request {})", event.context.request_id);

    // 任何錯誤都回報給 Lambda，由觸發端決定是否重試
    let report = engine.run_event(event.payload).await.map_err(|e| {
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        Box::new(e) as Box<dyn std::error::Error + Send + Sync>
    })?;

    tracing::info!("ETL Lambda function completed successfully");
    Ok(Response {
        message: "ETL process completed successfully".to_string(),
        bucket: report.location.bucket,
        key: report.location.key,
        table: report.load.table,
        write_mode: report.load.mode,
        rows_loaded: report.load.rows_written,
        total_rows: report.load.total_rows,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    let lambda_config = LambdaConfig::from_env()?;
    lambda_config.validate()?;

    // 創建AWS配置和S3客戶端
    let shared_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let mut s3_config =
        aws_sdk_s3::config::Builder::from(&shared_config).force_path_style(lambda_config.force_path_style);
    if let Some(region) = &lambda_config.s3_region {
        s3_config = s3_config.region(Region::new(region.clone()));
    }
    let s3_client = S3Client::from_conf(s3_config.build());

    let etl = &lambda_config.etl;
    tracing::info!(
        "Target {} table {} ({})",
        etl.database.redacted_uri(),
        etl.load.table,
        etl.load.write_mode
    );

    // 目標資料庫檔案必須放在掛載的持久儲存 (EFS) 上
    let storage = S3Storage::new(s3_client);
    let sink = SqliteSink::new(etl.database.clone(), etl.timeouts.load());
    let engine: Engine = EtlEngine::new(TransactionPipeline::new(storage, sink, etl));

    run(service_fn(|event| function_handler(&engine, event))).await
}
