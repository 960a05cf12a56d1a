use crate::utils::error::ImportError;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Import(#[from] ImportError),
}

#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            Self::Multipart(err) => (err.status(), "bad_request", err.body_text()),
            Self::Import(err) if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, "bad_request", err.to_string())
            }
            Self::Import(err) => {
                tracing::error!(error = %err, category = ?err.category(), "import failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    err.user_friendly_message(),
                )
            }
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
