use crate::core::event::{NotificationReport, ObjectOutcome, StorageNotification};
use crate::core::export::render_export;
use crate::core::pipeline::IngestionPipeline;
use crate::core::{ConfigProvider, CustomerStore, Storage};
use crate::domain::model::{CustomerRecord, ImportSummary};
use crate::utils::error::Result;
use crate::utils::validation::validate_csv_filename;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

/// Entry point shared by the HTTP handlers, the Lambda and the CLI.
///
/// Every delivery path boils down to a filename plus bytes; the engine checks the
/// name, runs the ingestion pipeline and, for uploads, keeps a copy of the raw file
/// in object storage.
pub struct ImportEngine<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    pipeline: IngestionPipeline,
}

impl<S: Storage, C: ConfigProvider> ImportEngine<S, C> {
    pub fn new(storage: S, config: C, store: Arc<dyn CustomerStore>) -> Self {
        Self {
            storage,
            config,
            pipeline: IngestionPipeline::new(store),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Imports bytes that arrived under `filename`, without archiving them.
    pub async fn import_bytes(&self, filename: &str, data: &[u8]) -> Result<ImportSummary> {
        validate_csv_filename(filename)?;
        tracing::info!("Importing '{}' ({} bytes)", filename, data.len());
        self.pipeline.ingest(data).await
    }

    /// Imports a directly uploaded file, then archives it to the upload bucket.
    ///
    /// Archiving is best effort: a storage failure is logged and the summary is
    /// still returned.
    pub async fn import_upload(&self, filename: &str, data: &[u8]) -> Result<ImportSummary> {
        let summary = self.import_bytes(filename, data).await?;

        if let Some(bucket) = self.config.archive_bucket() {
            self.archive_upload(bucket, filename, data).await;
        }

        Ok(summary)
    }

    async fn archive_upload(&self, bucket: &str, filename: &str, data: &[u8]) -> Option<String> {
        let key = archive_key(filename);

        tracing::debug!("Uploading '{}' ({} bytes) to bucket '{}'", key, data.len(), bucket);
        match self.storage.write_object(bucket, &key, data).await {
            Ok(()) => {
                tracing::info!("Archived upload as {}/{}", bucket, key);
                Some(key)
            }
            Err(e) => {
                tracing::warn!("Failed to archive upload '{}': {}", filename, e);
                None
            }
        }
    }

    /// Fetches one object and imports it.
    pub async fn import_object(&self, bucket: &str, key: &str) -> Result<ImportSummary> {
        validate_csv_filename(key)?;
        tracing::info!("Downloading '{}' from bucket '{}'", key, bucket);
        let data = self.storage.read_object(bucket, key).await?;
        self.pipeline.ingest(data.as_slice()).await
    }

    /// Imports every CSV object named in a notification.
    ///
    /// A failure on one object is reported in its item and does not stop the others.
    pub async fn process_notification(&self, notification: &StorageNotification) -> NotificationReport {
        let mut report = NotificationReport::default();

        for record in &notification.records {
            let Some((bucket, object)) = record.location() else {
                continue;
            };

            if validate_csv_filename(&object).is_err() {
                report.items.push(ObjectOutcome::Skipped {
                    bucket,
                    object,
                    skipped: "not a .csv".to_string(),
                });
                continue;
            }

            match self.import_object(&bucket, &object).await {
                Ok(summary) => {
                    tracing::info!(
                        "Imported {} rows, errors {} from {}/{}",
                        summary.inserted,
                        summary.error_count(),
                        bucket,
                        object
                    );
                    report.ok += summary.inserted;
                    report.errors += summary.error_count();
                    report.items.push(ObjectOutcome::Imported {
                        bucket,
                        object,
                        inserted: summary.inserted,
                        errors: summary.error_count(),
                    });
                }
                Err(e) => {
                    tracing::warn!("Error for {}/{}: {}", bucket, object, e);
                    report.items.push(ObjectOutcome::Failed {
                        bucket,
                        object,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    pub async fn recent(&self) -> Result<Vec<CustomerRecord>> {
        self.pipeline
            .store()
            .list_recent(self.config.recent_limit())
            .await
    }

    pub async fn export_csv(&self) -> Result<Vec<u8>> {
        let records = self.pipeline.store().list_all().await?;
        render_export(&records)
    }
}

/// `<YYYYMMDDTHHMMSSZ>_<basename>`
fn archive_key(filename: &str) -> String {
    let basename = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload.csv");
    format!("{}_{}", Utc::now().format("%Y%m%dT%H%M%SZ"), basename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::local::LocalStorage;
    use crate::db::memory::MemoryStore;
    use crate::domain::model::RowFailureReason;
    use crate::utils::error::ImportError;
    use tempfile::TempDir;

    struct TestConfig {
        archive: bool,
    }

    impl ConfigProvider for TestConfig {
        fn archive_bucket(&self) -> Option<&str> {
            self.archive.then_some("uploads")
        }

        fn recent_limit(&self) -> usize {
            2
        }
    }

    fn engine(dir: &TempDir, archive: bool) -> ImportEngine<LocalStorage, TestConfig> {
        let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
        ImportEngine::new(storage, TestConfig { archive }, Arc::new(MemoryStore::new()))
    }

    fn notification(entries: &[(&str, &str)]) -> StorageNotification {
        let records: Vec<serde_json::Value> = entries
            .iter()
            .map(|(bucket, key)| {
                serde_json::json!({"s3": {"bucket": {"name": bucket}, "object": {"key": key}}})
            })
            .collect();
        serde_json::from_value(serde_json::json!({ "Records": records })).unwrap()
    }

    #[tokio::test]
    async fn test_non_csv_upload_is_rejected_before_ingest() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, true);

        let result = engine
            .import_upload("customers.xlsx", b"name,email,age\nAlice,alice@example.com,30\n")
            .await;

        assert!(matches!(result, Err(ImportError::UnsupportedFile { .. })));
        assert!(engine.recent().await.unwrap().is_empty());
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn test_upload_is_archived_with_timestamp_prefix() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, true);
        let data = b"name,email,age\nAlice,alice@example.com,30\n";

        let summary = engine.import_upload("some/dir/Customers.CSV", data).await.unwrap();

        assert_eq!(summary.inserted, 1);
        let archived: Vec<String> = std::fs::read_dir(dir.path().join("uploads"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(archived.len(), 1);
        assert!(archived[0].ends_with("Z_Customers.CSV"), "{}", archived[0]);
        assert_eq!(std::fs::read(dir.path().join("uploads").join(&archived[0])).unwrap(), data);
    }

    #[tokio::test]
    async fn test_header_error_skips_archive() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, true);

        let result = engine.import_upload("bad.csv", b"name,email\nA,b@c.de\n").await;

        assert!(matches!(result, Err(ImportError::HeaderError { .. })));
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn test_notification_imports_skips_and_reports_failures() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, false);
        let incoming = dir.path().join("incoming");
        std::fs::create_dir_all(&incoming).unwrap();
        std::fs::write(
            incoming.join("batch one.csv"),
            "name,email,age\nAlice,alice@example.com,30\nBob,bob@example,25\n",
        )
        .unwrap();
        std::fs::write(incoming.join("broken.csv"), "name,age\nAlice,30\n").unwrap();

        let report = engine
            .process_notification(&notification(&[
                ("incoming", "batch+one.csv"),
                ("incoming", "notes.txt"),
                ("incoming", "broken.csv"),
                ("incoming", "missing.csv"),
                ("", "ignored.csv"),
            ]))
            .await;

        assert_eq!(report.ok, 1);
        assert_eq!(report.errors, 1);
        assert_eq!(report.items.len(), 4);
        assert_eq!(
            report.items[0],
            ObjectOutcome::Imported {
                bucket: "incoming".to_string(),
                object: "batch one.csv".to_string(),
                inserted: 1,
                errors: 1,
            }
        );
        assert!(matches!(&report.items[1], ObjectOutcome::Skipped { skipped, .. } if skipped == "not a .csv"));
        assert!(matches!(&report.items[2], ObjectOutcome::Failed { error, .. } if error.contains("Header")));
        assert!(matches!(&report.items[3], ObjectOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_recent_uses_configured_limit_and_export_is_oldest_first() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, false);
        engine
            .import_bytes(
                "three.csv",
                b"name,email,age\nAnn,ann@example.com,30\nBen,ben@example.com,31\nCal,cal@example.com,32\n",
            )
            .await
            .unwrap();

        let recent: Vec<String> = engine.recent().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(recent, vec!["Cal", "Ben"]);

        let export = String::from_utf8(engine.export_csv().await.unwrap()).unwrap();
        let lines: Vec<&str> = export.lines().collect();
        assert_eq!(lines[0], "name,email,age,created_at");
        assert!(lines[1].starts_with("Ann,ann@example.com,30,"));
        assert!(lines[3].starts_with("Cal,cal@example.com,32,"));
        assert!(lines[1].ends_with('Z'));
    }

    #[tokio::test]
    async fn test_reimport_through_engine_is_all_duplicates() {
        let dir = TempDir::new().unwrap();
        let engine = engine(&dir, false);
        let data = b"name,email,age\nAnn,ann@example.com,30\n";

        engine.import_bytes("a.csv", data).await.unwrap();
        let again = engine.import_bytes("a.csv", data).await.unwrap();

        assert_eq!(again.inserted, 0);
        assert_eq!(again.failures[0].reason, RowFailureReason::DuplicateEmail);
    }
}
