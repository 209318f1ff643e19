use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to initialize OCR engine: {0}")]
    InitializationError(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Request body too large: {0}")]
    BodyLimitExceeded(String),

    #[error("Preprocessing failed: {0}")]
    PreprocessingError(String),

    #[error("OCR engine failed: {0}")]
    OcrEngineFailure(String),

    #[error("Text revision failed: {0}")]
    RevisionServiceFailure(String),

    #[error("No file provided")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            OcrError::InvalidConfiguration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_CONFIGURATION")
            }
            OcrError::InitializationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INIT_ERROR"),
            OcrError::InvalidImage(_) => (StatusCode::BAD_REQUEST, "INVALID_IMAGE"),
            OcrError::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            OcrError::BodyLimitExceeded(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            OcrError::PreprocessingError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PREPROCESSING_ERROR")
            }
            OcrError::OcrEngineFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "OCR_ENGINE_FAILURE"),
            OcrError::RevisionServiceFailure(_) => (StatusCode::BAD_GATEWAY, "REVISION_FAILURE"),
            OcrError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            OcrError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            OcrError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_and_code().0.is_client_error()
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for OcrError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(code, "Request failed: {}", self);
        } else {
            tracing::warn!(code, "Request rejected: {}", self);
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
