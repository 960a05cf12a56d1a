use crate::core::engine::ImportEngine;
use crate::core::event::{NotificationReport, StorageNotification};
use crate::core::export::SAMPLE_CSV;
use crate::core::{ConfigProvider, CustomerRecord, ImportSummary, Storage};
use crate::server::error::{ApiError, ApiResult};
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

type Engine<S, C> = State<Arc<ImportEngine<S, C>>>;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub summary: ImportSummary,
    pub error_count: usize,
    pub recent: Vec<CustomerRecord>,
}

fn csv_attachment(filename: &'static str, body: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        body,
    )
}

pub async fn home<S, C>(State(engine): Engine<S, C>) -> ApiResult<Json<Vec<CustomerRecord>>>
where
    S: Storage + 'static,
    C: ConfigProvider + 'static,
{
    Ok(Json(engine.recent().await?))
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn sample() -> impl IntoResponse {
    csv_attachment("sample_customers.csv", SAMPLE_CSV.to_vec())
}

pub async fn export<S, C>(State(engine): Engine<S, C>) -> ApiResult<impl IntoResponse>
where
    S: Storage + 'static,
    C: ConfigProvider + 'static,
{
    let body = engine.export_csv().await?;
    Ok(csv_attachment("customers_export.csv", body))
}

pub async fn upload<S, C>(
    State(engine): Engine<S, C>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>>
where
    S: Storage + 'static,
    C: ConfigProvider + 'static,
{
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("").to_string();
            let data = field.bytes().await?;
            upload = Some((filename, data));
            break;
        }
    }

    let Some((filename, data)) = upload else {
        return Err(ApiError::BadRequest("Please choose a CSV file".to_string()));
    };
    if filename.is_empty() {
        return Err(ApiError::BadRequest("Please choose a CSV file".to_string()));
    }

    let summary = engine.import_upload(&filename, &data).await?;
    tracing::info!(
        "Upload '{}': inserted {}, errors {}",
        filename,
        summary.inserted,
        summary.error_count()
    );

    Ok(Json(UploadResponse {
        error_count: summary.error_count(),
        summary,
        recent: engine.recent().await?,
    }))
}

/// Storage webhook. Always answers 200 so the sender does not retry.
pub async fn obs_event<S, C>(State(engine): Engine<S, C>, body: Bytes) -> Json<NotificationReport>
where
    S: Storage + 'static,
    C: ConfigProvider + 'static,
{
    let notification = match serde_json::from_slice::<StorageNotification>(&body) {
        Ok(notification) => notification,
        Err(e) => {
            tracing::warn!("Ignoring unparseable notification: {}", e);
            StorageNotification::default()
        }
    };

    Json(engine.process_notification(&notification).await)
}
