//! Decode, normalize and recognize a single upload

pub mod engine;
pub mod engines;
pub mod preprocessing;

use crate::config::Config;
use crate::error::OcrError;
use engine::{OcrEngine, OcrOptions};
use image::DynamicImage;
use preprocessing::{Pipeline, PipelineConfig, PreprocessingResult};
use std::sync::Arc;

/// Text recognized from one image plus how it was normalized
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub text: String,
    pub preprocessing: PreprocessingResult,
}

/// Shared, read-only OCR front end: one engine, one pipeline, one set of options
pub struct OcrProcessor {
    engine: Arc<dyn OcrEngine>,
    pipeline: Pipeline,
    options: OcrOptions,
}

impl OcrProcessor {
    /// Initialize the compiled-in engine
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        let engine = engines::build_engine(config)?;
        Ok(Self::with_engine(engine, config))
    }

    /// Use an already constructed engine
    pub fn with_engine(engine: Arc<dyn OcrEngine>, config: &Config) -> Self {
        Self {
            engine,
            pipeline: Pipeline::new(config.pipeline),
            options: config.ocr.clone(),
        }
    }

    /// Run the full decode -> normalize -> recognize sequence
    ///
    /// Blocks for the duration of the engine call.
    pub fn process(&self, bytes: &[u8]) -> Result<ProcessedImage, OcrError> {
        let image = decode_image(bytes)?;

        tracing::debug!(
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            "Decoded upload"
        );

        let preprocessing = self.pipeline.process(image)?;
        let result = self.engine.recognize(&preprocessing.image, &self.options)?;

        Ok(ProcessedImage {
            text: result.text,
            preprocessing,
        })
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn engine_description(&self) -> &'static str {
        self.engine.description()
    }

    pub fn supported_languages(&self) -> Vec<String> {
        self.engine.supported_languages()
    }

    pub fn options(&self) -> &OcrOptions {
        &self.options
    }

    pub fn pipeline_config(&self) -> &PipelineConfig {
        self.pipeline.config()
    }
}

/// Decode upload bytes, guessing the format from the content
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, OcrError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| OcrError::InvalidImage(format!("Failed to decode image: {}", e)))?;

    if image.width() == 0 || image.height() == 0 {
        return Err(OcrError::InvalidImage("image has no pixels".to_string()));
    }

    Ok(image)
}
