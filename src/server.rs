use crate::config::Config;
use crate::error::OcrError;
use crate::ocr::engine::OcrOptions;
use crate::ocr::preprocessing::{PipelineConfig, PreprocessingResult};
use crate::ocr::{OcrProcessor, ProcessedImage};
use crate::revision::{self, TextReviser};
use crate::upload::Upload;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<OcrProcessor>,
    pub reviser: Arc<dyn TextReviser>,
    pub config: Arc<Config>,
}

/// Single-image OCR response
#[derive(Serialize)]
pub struct OcrResponse {
    pub extracted_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_text: Option<String>,
    pub processing_time_ms: u64,
    pub preprocessing: PreprocessingResult,
}

/// One entry of a batch response, in upload order
#[derive(Serialize)]
pub struct BatchItem {
    pub filename: Option<String>,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Text { extracted_text: String },
    Error { error: String },
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchItem>,
    pub processing_time_ms: u64,
}

#[derive(Deserialize)]
pub struct ReviseRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct ReviseResponse {
    pub revised_text: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub engine: String,
    pub engine_description: String,
    pub supported_formats: Vec<String>,
    pub supported_languages: Vec<String>,
    pub ocr: OcrOptions,
    pub pipeline: PipelineConfig,
    pub max_file_size_bytes: usize,
    pub max_batch_files: usize,
    pub revision: String,
}

/// Build the router with per-route body limits
pub fn router(state: AppState) -> Router {
    let single_limit = state.config.single_upload_body_limit();
    let batch_limit = state.config.batch_body_limit();

    Router::new()
        .route(
            "/ocr",
            post(handle_ocr).layer(DefaultBodyLimit::max(single_limit)),
        )
        .route(
            "/ocr/batch",
            post(handle_batch).layer(DefaultBodyLimit::max(batch_limit)),
        )
        .route("/revise", post(handle_revise))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let processor = OcrProcessor::new(&config)?;
    let reviser = revision::build_reviser(config.revision.as_ref())?;
    let addr = format!("{}:{}", config.host, config.port);

    let state = AppState {
        processor: Arc::new(processor),
        reviser,
        config: Arc::new(config),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle single-image OCR requests
async fn handle_ocr(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<OcrResponse>, OcrError> {
    let start = Instant::now();

    let mut upload: Option<Upload> = None;
    let mut revise = false;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                if upload.is_some() {
                    return Err(OcrError::InvalidRequest(
                        "Only one file per request; use /ocr/batch for several".to_string(),
                    ));
                }
                let filename = field.file_name().map(|s| s.to_string());
                let data = field.bytes().await.map_err(multipart_error)?;
                upload = Some(Upload { filename, data });
            }
            "revise" => {
                let value = field.text().await.map_err(multipart_error)?;
                revise = parse_flag(&value)?;
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let upload = upload.ok_or(OcrError::MissingFile)?;
    upload.validate(state.config.max_file_size)?;

    let processed = process_upload(&state.processor, upload).await?;

    let revised_text = if revise {
        Some(revision::revise_or_original(state.reviser.as_ref(), &processed.text).await)
    } else {
        None
    };

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "OCR completed in {}ms, threshold: {}, text length: {}",
        processing_time_ms,
        processed.preprocessing.threshold,
        processed.text.len()
    );

    Ok(Json(OcrResponse {
        extracted_text: processed.text,
        revised_text,
        processing_time_ms,
        preprocessing: processed.preprocessing,
    }))
}

/// Handle batch OCR requests; one bad file never fails the batch
async fn handle_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchResponse>, OcrError> {
    let start = Instant::now();
    let max_files = state.config.max_batch_files;
    let mut uploads: Vec<Upload> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name != "file" && name != "files" {
            continue;
        }

        if uploads.len() == max_files {
            return Err(OcrError::InvalidRequest(format!(
                "Too many files: at most {} per batch",
                max_files
            )));
        }

        let filename = field.file_name().map(|s| s.to_string());
        let data = field.bytes().await.map_err(multipart_error)?;
        uploads.push(Upload { filename, data });
    }

    if uploads.is_empty() {
        return Err(OcrError::MissingFile);
    }

    let mut results = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let filename = upload.filename.clone();
        let outcome = match upload.validate(state.config.max_file_size) {
            Ok(()) => process_upload(&state.processor, upload).await,
            Err(e) => Err(e),
        };

        let outcome = match outcome {
            Ok(processed) => BatchOutcome::Text {
                extracted_text: processed.text,
            },
            Err(e) => {
                tracing::warn!(filename = ?filename, error = %e, "Batch item failed");
                BatchOutcome::Error {
                    error: e.to_string(),
                }
            }
        };
        results.push(BatchItem { filename, outcome });
    }

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        "Batch of {} completed in {}ms",
        results.len(),
        processing_time_ms
    );

    Ok(Json(BatchResponse {
        results,
        processing_time_ms,
    }))
}

/// Handle standalone text revision; always succeeds for a valid body
async fn handle_revise(
    State(state): State<AppState>,
    payload: Result<Json<ReviseRequest>, JsonRejection>,
) -> Result<Json<ReviseResponse>, OcrError> {
    let Json(request) = payload.map_err(|e| OcrError::InvalidRequest(e.body_text()))?;

    let revised_text = revision::revise_or_original(state.reviser.as_ref(), &request.text).await;

    Ok(Json(ReviseResponse { revised_text }))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: state.processor.engine_name().to_string(),
        engine_description: state.processor.engine_description().to_string(),
        supported_formats: crate::upload::SUPPORTED_FORMATS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        supported_languages: state.processor.supported_languages(),
        ocr: state.processor.options().clone(),
        pipeline: *state.processor.pipeline_config(),
        max_file_size_bytes: state.config.max_file_size,
        max_batch_files: state.config.max_batch_files,
        revision: state.reviser.name().to_string(),
    })
}

/// Decode, normalize and recognize off the async runtime
async fn process_upload(
    processor: &Arc<OcrProcessor>,
    upload: Upload,
) -> Result<ProcessedImage, OcrError> {
    let processor = Arc::clone(processor);
    tokio::task::spawn_blocking(move || processor.process(&upload.data))
        .await
        .map_err(|e| OcrError::Internal(format!("OCR task failed: {}", e)))?
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> OcrError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        OcrError::BodyLimitExceeded(e.body_text())
    } else {
        OcrError::InvalidRequest(format!("Failed to parse multipart: {}", e.body_text()))
    }
}

fn parse_flag(value: &str) -> Result<bool, OcrError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        other => Err(OcrError::InvalidRequest(format!(
            "Invalid value for revise: '{}'",
            other
        ))),
    }
}
