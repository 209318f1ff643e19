//! Tesseract engine implementation
//!
//! Drives the `tesseract` command-line program through rusty-tesseract, so
//! the binary and the traineddata for every configured language must be
//! installed on the host.

use crate::error::OcrError;
use crate::ocr::engine::{OcrEngine, OcrOptions, OcrResult};
use image::{GrayImage, ImageFormat};
use rusty_tesseract::{Args, Image};
use std::collections::HashMap;

/// Tesseract OCR Engine
pub struct TesseractEngine {
    installed_languages: Vec<String>,
}

impl TesseractEngine {
    /// Check that tesseract runs and has every configured language
    pub fn new(options: &OcrOptions) -> Result<Self, OcrError> {
        let version = rusty_tesseract::get_tesseract_version().map_err(|e| {
            OcrError::InitializationError(format!("tesseract binary not available: {}", e))
        })?;

        let installed_languages = rusty_tesseract::get_tesseract_langs().map_err(|e| {
            OcrError::InitializationError(format!("Failed to list tesseract languages: {}", e))
        })?;

        let missing: Vec<&str> = options
            .languages
            .codes()
            .iter()
            .filter(|code| !installed_languages.contains(code))
            .map(String::as_str)
            .collect();

        if !missing.is_empty() {
            return Err(OcrError::InitializationError(format!(
                "tesseract is missing traineddata for: {}",
                missing.join(", ")
            )));
        }

        tracing::info!(
            version = %version.lines().next().unwrap_or_default(),
            languages = %options.languages.joined(),
            oem = options.engine_mode.code(),
            psm = options.segmentation_mode.code(),
            "Tesseract engine initialized"
        );

        Ok(Self {
            installed_languages,
        })
    }
}

/// Command-line arguments for one recognition call
fn build_args(options: &OcrOptions) -> Args {
    Args {
        lang: options.languages.joined(),
        config_variables: HashMap::new(),
        dpi: options.dpi.and_then(|dpi| i32::try_from(dpi).ok()),
        psm: Some(options.segmentation_mode.code()),
        oem: Some(options.engine_mode.code()),
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR through the command-line interface"
    }

    fn recognize(&self, image: &GrayImage, options: &OcrOptions) -> Result<OcrResult, OcrError> {
        // The CLI reads from disk; PNG keeps the bitmap lossless
        let temp_file = tempfile::Builder::new()
            .prefix("scanocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Internal(format!("Failed to create temp file: {}", e)))?;

        image
            .save_with_format(temp_file.path(), ImageFormat::Png)
            .map_err(|e| OcrError::Internal(format!("Failed to write temp image: {}", e)))?;

        let input = Image::from_path(temp_file.path())
            .map_err(|e| OcrError::OcrEngineFailure(format!("Failed to load image: {}", e)))?;

        let text = rusty_tesseract::image_to_string(&input, &build_args(options))
            .map_err(|e| OcrError::OcrEngineFailure(e.to_string()))?;

        Ok(OcrResult {
            text: text.trim().to_string(),
        })
    }

    fn supported_languages(&self) -> Vec<String> {
        self.installed_languages.clone()
    }
}
