use clap::Parser;
use transaction_etl::utils::error::ErrorSeverity;
use transaction_etl::utils::{logger, validation::Validate};
use transaction_etl::{CliConfig, EtlEngine, LocalStorage, SqliteSink, TransactionPipeline};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting transaction-etl");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.to_etl_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let location = match config.source.location() {
        Ok(location) => location,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: pass --bucket and --key, or set them under [source]");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Target {} table {} ({})",
        config.database.redacted_uri(),
        config.load.table,
        config.load.write_mode
    );

    let storage = LocalStorage::new(cli.storage_root.clone());
    let sink = SqliteSink::new(config.database.clone(), config.timeouts.load());
    let pipeline = TransactionPipeline::new(storage, sink, &config);
    let engine = EtlEngine::new(pipeline);

    match engine.run(location).await {
        Ok(report) => {
            let total = report
                .load
                .total_rows
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string());
            println!("✅ ETL process completed successfully!");
            println!(
                "📁 {} rows from {} written to {} ({}), table now holds {} rows",
                report.load.rows_written,
                report.location,
                report.load.table,
                report.load.mode,
                total
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code);
        }
    }
}
