use crate::error::OcrError;
use image::{GrayImage, Luma};

/// Smallest intensity spread worth stretching. Narrower ranges are treated
/// as blank pages and left alone so sensor noise is not blown up to full
/// contrast.
pub const MIN_STRETCH_RANGE: u8 = 8;

/// Normalize image contrast using histogram stretching
/// Maps the observed min/max to 0/255
pub fn apply(gray: GrayImage) -> Result<GrayImage, OcrError> {
    let (min_val, max_val) = find_min_max(&gray);

    // Already full-range
    if min_val == 0 && max_val == 255 {
        return Ok(gray);
    }

    let range = max_val.saturating_sub(min_val);
    if range < MIN_STRETCH_RANGE {
        tracing::debug!(min = min_val, max = max_val, "Skipping normalize on near-uniform image");
        return Ok(gray);
    }

    let scale = 255.0 / range as f32;
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let offset = (value as i32 - min_val as i32).clamp(0, range as i32) as f32;
        *slot = (offset * scale).round().min(255.0) as u8;
    }

    let mut stretched = gray;
    for pixel in stretched.pixels_mut() {
        *pixel = Luma([lut[pixel.0[0] as usize]]);
    }

    Ok(stretched)
}

fn find_min_max(img: &GrayImage) -> (u8, u8) {
    let mut min = 255u8;
    let mut max = 0u8;

    for pixel in img.pixels() {
        let val = pixel.0[0];
        min = min.min(val);
        max = max.max(val);
    }

    (min, max)
}
