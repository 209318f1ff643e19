//! Individual preprocessing steps, in pipeline order:
//! grayscale, normalize, denoise, threshold

pub mod denoise;
pub mod grayscale;
pub mod normalize;
pub mod threshold;
