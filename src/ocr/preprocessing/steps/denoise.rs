use crate::error::OcrError;
use image::GrayImage;
use imageproc::filter::separable_filter_equal;
use serde::Serialize;

/// Side length of the square Gaussian kernel. Always odd and non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KernelSize(u32);

impl KernelSize {
    pub fn new(size: u32) -> Result<Self, OcrError> {
        if size == 0 || size % 2 == 0 {
            return Err(OcrError::InvalidConfiguration(format!(
                "blur kernel size must be a positive odd number, got {}",
                size
            )));
        }
        Ok(Self(size))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Apply a separable Gaussian blur to suppress speckle before binarization
///
/// A 1x1 kernel is the identity. Pixels past the border repeat the edge.
pub fn apply(gray: GrayImage, kernel_size: KernelSize) -> Result<GrayImage, OcrError> {
    if kernel_size.get() == 1 || gray.width() == 0 || gray.height() == 0 {
        return Ok(gray);
    }

    let kernel = gaussian_kernel(kernel_size);
    Ok(separable_filter_equal(&gray, &kernel))
}

/// Build normalized 1D Gaussian weights for the kernel size
///
/// Sizes up to 7 use the fixed binomial tables OpenCV uses when no sigma is
/// given; larger sizes derive sigma from the size with the same formula.
fn gaussian_kernel(kernel_size: KernelSize) -> Vec<f32> {
    match kernel_size.get() {
        1 => vec![1.0],
        3 => vec![0.25, 0.5, 0.25],
        5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => vec![0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
        size => {
            let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
            let half = (size / 2) as i32;
            let weights: Vec<f32> = (-half..=half)
                .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
                .collect();
            let sum: f32 = weights.iter().sum();
            weights.into_iter().map(|w| w / sum).collect()
        }
    }
}
