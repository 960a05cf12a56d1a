use clap::Parser;
use csv_intake::core::engine::ImportEngine;
use csv_intake::core::export::SAMPLE_CSV;
use csv_intake::core::{CustomerRecord, ImportSummary, Storage};
use csv_intake::utils::error::{ErrorSeverity, ImportError, Result};
use csv_intake::utils::{logger, validation::Validate};
use csv_intake::{server, CliConfig, Command, ConfiguredStorage, ServiceConfig, SqliteStore};
use std::io::Write;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(cli).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ csv-intake failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );

        // 輸出用戶友好的錯誤信息
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

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

async fn run(cli: CliConfig) -> Result<()> {
    if let Command::Sample = cli.command {
        std::io::stdout().write_all(SAMPLE_CSV)?;
        return Ok(());
    }

    let config = cli.service_config()?;
    // 驗證配置
    config.validate()?;

    let store = SqliteStore::connect(&config.database.path, config.database.max_connections).await?;
    run_with_store(&cli, config, store).await
}

/// Runs the command, then closes the pool on every outcome.
async fn run_with_store(cli: &CliConfig, config: ServiceConfig, store: SqliteStore) -> Result<()> {
    let outcome = execute(cli, config, &store).await;
    store.close().await;
    outcome
}

async fn execute(cli: &CliConfig, config: ServiceConfig, store: &SqliteStore) -> Result<()> {
    let storage = ConfiguredStorage::from_config(&config.storage).await?;
    tracing::debug!("Using {} object storage", storage.describe());

    let server_config = config.server.clone();
    let engine = ImportEngine::new(storage, config, Arc::new(store.clone()));

    match &cli.command {
        Command::Serve { .. } => {
            // 啟動時先確認物件儲存可連線
            let buckets = engine.storage().list_buckets().await?;
            tracing::info!("Object storage reachable ({} buckets)", buckets.len());
            server::serve(Arc::new(engine), &server_config).await
        }
        Command::Import { file } => {
            let data = tokio::fs::read(file).await?;
            let filename = file.to_string_lossy();
            let summary = engine.import_bytes(&filename, &data).await?;
            print_summary(&summary, cli.json)
        }
        Command::Export { output } => {
            let data = engine.export_csv().await?;
            match output {
                Some(path) => {
                    tokio::fs::write(path, &data).await?;
                    println!("📁 Export saved to: {}", path.display());
                    Ok(())
                }
                None => std::io::stdout().write_all(&data).map_err(ImportError::from),
            }
        }
        Command::Recent { .. } => {
            let records = engine.recent().await?;
            print_records(&records, cli.json)
        }
        Command::Sample => Ok(()),
    }
}

fn print_summary(summary: &ImportSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!(
        "✅ Inserted {} rows, {} errors",
        summary.inserted,
        summary.error_count()
    );
    for failure in &summary.failures {
        println!("  row {}: {}", failure.row, failure.message);
    }
    Ok(())
}

fn print_records(records: &[CustomerRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No records yet");
    }
    for record in records {
        println!(
            "{:>5}  {:<24} {:<32} {:>3}  {}",
            record.id,
            record.name,
            record.email,
            record.age,
            record.created_at_string()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv_intake::core::CustomerStore;
    use tempfile::TempDir;

    async fn setup(dir: &TempDir) -> (ServiceConfig, SqliteStore) {
        let mut config = ServiceConfig::default();
        config.database.path = dir.path().join("app.db").to_str().unwrap().to_string();
        config.storage.path = dir.path().join("objects").to_str().unwrap().to_string();
        let store = SqliteStore::connect(&config.database.path, 2).await.unwrap();
        (config, store)
    }

    #[tokio::test]
    async fn test_failed_import_still_closes_pool() {
        let dir = TempDir::new().unwrap();
        let (config, store) = setup(&dir).await;
        let handle = store.clone();
        let missing = dir.path().join("missing.csv");
        let cli = CliConfig::parse_from(["csv-intake", "import", missing.to_str().unwrap()]);

        let result = run_with_store(&cli, config, store).await;

        assert!(matches!(result, Err(ImportError::IoError(_))));
        assert!(handle.list_all().await.is_err());
    }

    #[tokio::test]
    async fn test_import_then_close() {
        let dir = TempDir::new().unwrap();
        let (config, store) = setup(&dir).await;
        let file = dir.path().join("customers.csv");
        std::fs::write(&file, SAMPLE_CSV).unwrap();
        let cli = CliConfig::parse_from(["csv-intake", "--json", "import", file.to_str().unwrap()]);

        run_with_store(&cli, config.clone(), store).await.unwrap();

        let reopened = SqliteStore::connect(&config.database.path, 1).await.unwrap();
        assert_eq!(reopened.list_all().await.unwrap().len(), 2);
    }
}
