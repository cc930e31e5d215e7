use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type shared by the CLI and the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Export error: {0}")]
    Export(String),

    /// A request body axum could not decode as JSON.
    #[error("{}", .0.body_text())]
    Rejection(#[from] JsonRejection),

    /// A malformed request; the message is returned to the caller verbatim.
    #[error("{0}")]
    BadRequest(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Ocr(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        AppError::Export(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Json(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Rejection(r) => (r.status(), r.body_text()),
            other => {
                tracing::error!(error = %other, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}
