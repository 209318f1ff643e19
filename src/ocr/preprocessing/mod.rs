//! Image normalization for OCR
//!
//! Turns an arbitrary decoded image into a binary, single-channel bitmap
//! Tesseract reads well. Every knob is deployment configuration.

pub mod pipeline;
pub mod steps;

pub use pipeline::{Pipeline, PipelineConfig, PreprocessingResult, StepTiming};
pub use steps::denoise::KernelSize;
pub use steps::threshold::ThresholdPolicy;
