use crate::error::DetectError;
use image::{DynamicImage, GrayImage, Luma};

/// Remove speckle noise from a binarized image with a 2x2 closing
/// (dilation followed by erosion).
pub fn apply(image: DynamicImage) -> Result<DynamicImage, DetectError> {
    let gray = image.to_luma8();
    let closed = erode_2x2(&dilate_2x2(&gray));
    Ok(DynamicImage::ImageLuma8(closed))
}

/// Max over the 2x2 window whose bottom-right corner is the pixel.
fn dilate_2x2(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let mut max = 0u8;
        for dy in 0..2u32 {
            for dx in 0..2u32 {
                let sx = x.saturating_sub(dx);
                let sy = y.saturating_sub(dy);
                max = max.max(img.get_pixel(sx, sy).0[0]);
            }
        }
        Luma([max])
    })
}

/// Min over the mirrored 2x2 window, so dilate then erode is a closing.
fn erode_2x2(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let mut min = 255u8;
        for dy in 0..2u32 {
            for dx in 0..2u32 {
                let sx = (x + dx).min(width - 1);
                let sy = (y + dy).min(height - 1);
                min = min.min(img.get_pixel(sx, sy).0[0]);
            }
        }
        Luma([min])
    })
}
