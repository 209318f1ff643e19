use crate::error::OcrError;
use image::{DynamicImage, GrayImage};
use serde::Serialize;
use std::time::Instant;

use super::steps;
use super::steps::denoise::KernelSize;
use super::steps::threshold::ThresholdPolicy;

/// Knobs for the normalization pipeline, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    /// Stretch intensities to the full 0-255 range before blurring
    pub normalize: bool,
    /// Gaussian kernel side length
    pub blur_kernel_size: KernelSize,
    pub threshold_policy: ThresholdPolicy,
    /// Cutoff used by [`ThresholdPolicy::Fixed`]
    pub fixed_threshold: u8,
}

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone, Serialize)]
pub struct PreprocessingResult {
    /// Normalized single-channel image (not serialized)
    #[serde(skip)]
    pub image: GrayImage,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    pub threshold_policy: ThresholdPolicy,
    /// Binarization cutoff actually applied
    pub threshold: u8,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Grayscale -> normalize -> denoise -> threshold, always in that order
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Normalize a decoded image into a binary bitmap of the same size
    pub fn process(&self, image: DynamicImage) -> Result<PreprocessingResult, OcrError> {
        let start = Instant::now();
        let mut timings = Vec::new();
        let dimensions = (image.width(), image.height());

        let mut gray = run_step("grayscale", image, &mut timings, steps::grayscale::apply)?;

        if self.config.normalize {
            gray = run_step("normalize", gray, &mut timings, steps::normalize::apply)?;
        }

        let kernel = self.config.blur_kernel_size;
        gray = run_step("denoise", gray, &mut timings, |img| {
            steps::denoise::apply(img, kernel)
        })?;

        let (policy, fixed) = (self.config.threshold_policy, self.config.fixed_threshold);
        let binarized = run_step("threshold", gray, &mut timings, |img| {
            steps::threshold::apply(img, policy, fixed)
        })?;

        if binarized.image.dimensions() != dimensions {
            return Err(OcrError::PreprocessingError(format!(
                "pipeline changed dimensions from {:?} to {:?}",
                dimensions,
                binarized.image.dimensions()
            )));
        }

        Ok(PreprocessingResult {
            image: binarized.image,
            total_time_ms: start.elapsed().as_millis() as u64,
            threshold_policy: policy,
            threshold: binarized.threshold,
            steps: timings,
        })
    }
}

fn run_step<I, O, F>(
    name: &str,
    input: I,
    timings: &mut Vec<StepTiming>,
    step_fn: F,
) -> Result<O, OcrError>
where
    F: FnOnce(I) -> Result<O, OcrError>,
{
    let step_start = Instant::now();
    let result = step_fn(input)?;
    timings.push(StepTiming {
        name: name.to_string(),
        time_ms: step_start.elapsed().as_millis() as u64,
    });
    Ok(result)
}
