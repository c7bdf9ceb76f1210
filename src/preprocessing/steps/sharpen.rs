use crate::error::DetectError;
use image::{DynamicImage, RgbImage};
use imageproc::filter::filter3x3;

/// High-pass sharpening kernel: center weight 5, 4-neighbors -1 each
const KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Sharpen edges so glyph boundaries survive binarization
pub fn apply(image: DynamicImage) -> Result<DynamicImage, DetectError> {
    let rgb = image.to_rgb8();
    let sharpened: RgbImage = filter3x3(&rgb, &KERNEL);
    Ok(DynamicImage::ImageRgb8(sharpened))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_sharpen_does_not_soften_edges() {
        // Left half dark, right half light
        let img = RgbImage::from_fn(20, 10, |x, _| {
            if x < 10 {
                Rgb([50, 50, 50])
            } else {
                Rgb([200, 200, 200])
            }
        });

        let result = apply(DynamicImage::ImageRgb8(img)).unwrap().to_luma8();

        let edge_left = result.get_pixel(9, 5).0[0] as i32;
        let edge_right = result.get_pixel(10, 5).0[0] as i32;

        let original_diff = 200 - 50;
        assert!(
            (edge_right - edge_left).abs() >= original_diff,
            "Edge should be enhanced: {} >= {}",
            (edge_right - edge_left).abs(),
            original_diff
        );
    }

    #[test]
    fn test_sharpen_preserves_dimensions() {
        let img = RgbImage::new(30, 20);
        let result = apply(DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(result.width(), 30);
        assert_eq!(result.height(), 20);
    }
}
