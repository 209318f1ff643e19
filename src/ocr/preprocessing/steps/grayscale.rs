use crate::error::OcrError;
use image::{DynamicImage, GrayImage};

/// Reduce the image to a single luminance channel
///
/// Color input is converted with luminance weights rather than a channel
/// average so dark text keeps its contrast against colored paper. Alpha is
/// dropped. 8-bit grayscale input is returned untouched.
pub fn apply(image: DynamicImage) -> Result<GrayImage, OcrError> {
    match image {
        DynamicImage::ImageLuma8(gray) => Ok(gray),
        other => Ok(other.to_luma8()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, LumaA, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_grayscale_uses_luminance_weights() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0])); // Red
        img.put_pixel(1, 0, Rgb([0, 255, 0])); // Green
        img.put_pixel(2, 0, Rgb([0, 0, 255])); // Blue

        let gray = apply(DynamicImage::ImageRgb8(img)).unwrap();

        let red = gray.get_pixel(0, 0).0[0];
        let green = gray.get_pixel(1, 0).0[0];
        let blue = gray.get_pixel(2, 0).0[0];

        // A channel average would make all three equal (85)
        assert!(green > red, "green {} should be brighter than red {}", green, red);
        assert!(red > blue, "red {} should be brighter than blue {}", red, blue);
    }

    #[test]
    fn test_grayscale_is_noop_for_gray_input() {
        let img = GrayImage::from_fn(16, 8, |x, y| Luma([(x * 13 + y * 7) as u8]));

        let result = apply(DynamicImage::ImageLuma8(img.clone())).unwrap();

        assert_eq!(result, img);
    }

    #[test]
    fn test_grayscale_drops_alpha() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 0]));
        let result = apply(DynamicImage::ImageRgba8(img)).unwrap();
        assert_eq!(result.get_pixel(0, 0).0[0], 255);

        let img = image::GrayAlphaImage::from_pixel(4, 4, LumaA([40, 128]));
        let result = apply(DynamicImage::ImageLumaA8(img)).unwrap();
        assert_eq!(result.get_pixel(3, 3).0[0], 40);
    }

    #[test]
    fn test_grayscale_preserves_dimensions() {
        let img = RgbImage::new(100, 50);
        let result = apply(DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(result.width(), 100);
        assert_eq!(result.height(), 50);
    }
}
