use csv_intake::config::s3::S3Storage;
use csv_intake::core::engine::ImportEngine;
use csv_intake::core::event::{NotificationReport, StorageNotification};
use csv_intake::utils::{logger, validation::Validate};
use csv_intake::{LambdaConfig, SqliteStore};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use std::sync::Arc;

type Engine = ImportEngine<S3Storage, LambdaConfig>;

async fn function_handler(
    engine: &Engine,
    event: LambdaEvent<StorageNotification>,
) -> Result<NotificationReport, Error> {
    tracing::info!(
        "Received notification with {} records",
        event.payload.records.len()
    );

    let report = engine.process_notification(&event.payload).await;

    tracing::info!("Imported {} rows, {} row errors", report.ok, report.errors);
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 創建Lambda配置
    let lambda_config = LambdaConfig::from_env()?;
    lambda_config.validate()?;

    let store = SqliteStore::connect(&lambda_config.database_path, 1).await?;
    let storage = S3Storage::connect(&lambda_config.s3_settings()).await;

    // 冷啟動時建立一次，之後的呼叫共用
    let engine = Arc::new(ImportEngine::new(storage, lambda_config, Arc::new(store)));

    run(service_fn(move |event: LambdaEvent<StorageNotification>| {
        let engine = Arc::clone(&engine);
        async move { function_handler(&engine, event).await }
    }))
    .await
}
