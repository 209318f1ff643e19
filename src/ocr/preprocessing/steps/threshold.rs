use crate::error::OcrError;
use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use serde::Serialize;

/// How the binarization cutoff is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdPolicy {
    /// Configured cutoff: pixels below it become black
    Fixed,
    /// Cutoff picked per image by maximizing between-class variance
    #[default]
    Otsu,
}

/// Binarized image plus the cutoff that produced it
#[derive(Debug, Clone)]
pub struct Binarized {
    pub image: GrayImage,
    pub threshold: u8,
}

/// Binarize to {0, 255} using the given policy
pub fn apply(gray: GrayImage, policy: ThresholdPolicy, fixed: u8) -> Result<Binarized, OcrError> {
    let binarized = match policy {
        ThresholdPolicy::Fixed => Binarized {
            image: fixed_threshold(gray, fixed),
            threshold: fixed,
        },
        ThresholdPolicy::Otsu => {
            let level = otsu_level(&gray);
            Binarized {
                image: otsu_threshold(gray, level),
                threshold: level,
            }
        }
    };

    Ok(binarized)
}

/// Pixels below `threshold` become 0, the rest 255
fn fixed_threshold(mut gray: GrayImage, threshold: u8) -> GrayImage {
    for pixel in gray.pixels_mut() {
        *pixel = if pixel.0[0] < threshold {
            Luma([0u8])
        } else {
            Luma([255u8])
        };
    }
    gray
}

/// Pixels at or below the Otsu level join the dark class
fn otsu_threshold(mut gray: GrayImage, level: u8) -> GrayImage {
    for pixel in gray.pixels_mut() {
        *pixel = if pixel.0[0] > level {
            Luma([255u8])
        } else {
            Luma([0u8])
        };
    }
    gray
}
