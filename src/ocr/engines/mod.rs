//! OCR engine implementations
//!
//! Engines are conditionally compiled based on feature flags.

#[cfg(feature = "engine-tesseract")]
pub mod tesseract;

use crate::config::Config;
use crate::error::OcrError;
use crate::ocr::engine::OcrEngine;
use std::sync::Arc;

/// Build the engine compiled into this binary
#[cfg(feature = "engine-tesseract")]
pub fn build_engine(config: &Config) -> Result<Arc<dyn OcrEngine>, OcrError> {
    tracing::info!("Initializing tesseract engine...");
    let engine = tesseract::TesseractEngine::new(&config.ocr)?;
    Ok(Arc::new(engine))
}

#[cfg(not(feature = "engine-tesseract"))]
pub fn build_engine(_config: &Config) -> Result<Arc<dyn OcrEngine>, OcrError> {
    Err(OcrError::InitializationError(
        "No OCR engines available. Build with --features engine-tesseract".to_string(),
    ))
}
