use crate::core::parser::CsvStreamParser;
use crate::core::validator;
use crate::domain::model::{ImportSummary, RowFailureReason};
use crate::domain::ports::{CustomerStore, InsertError};
use crate::utils::error::Result;
use std::io::Read;
use std::sync::Arc;

/// Validates and persists every row of one CSV stream.
///
/// All inserts of a call share one store session that is committed after the last
/// row. A header error, a stream error or a store fault returns `Err` and drops the
/// session, so nothing from that call is kept. Bad rows and duplicate emails are
/// not errors: they end up in [`ImportSummary::failures`].
#[derive(Clone)]
pub struct IngestionPipeline {
    store: Arc<dyn CustomerStore>,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CustomerStore> {
        &self.store
    }

    pub async fn ingest<R: Read + Send>(&self, reader: R) -> Result<ImportSummary> {
        let rows = CsvStreamParser::new(reader)?;
        let mut session = self.store.begin().await?;
        let mut summary = ImportSummary::default();

        for row in rows {
            let row = row?;

            let record = match validator::validate(&row) {
                Ok(record) => record,
                Err(reason) => {
                    tracing::debug!("Row {} rejected: {}", row.number, reason);
                    summary.record_failure(row.number, reason);
                    continue;
                }
            };

            match session.insert(&record).await {
                Ok(_) => summary.record_inserted(),
                Err(InsertError::Conflict { email }) => {
                    tracing::debug!("Row {} duplicates existing email {}", row.number, email);
                    summary.record_failure(row.number, RowFailureReason::DuplicateEmail);
                }
                Err(InsertError::Fault(e)) => {
                    tracing::error!("Store fault at row {}, rolling back import: {}", row.number, e);
                    return Err(e);
                }
            }
        }

        session.commit().await?;

        tracing::info!(
            "Import finished: {} rows, {} inserted, {} rejected",
            summary.total_rows(),
            summary.inserted,
            summary.error_count()
        );
        Ok(summary)
    }
}
