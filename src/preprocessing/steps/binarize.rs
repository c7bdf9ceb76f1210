use crate::error::DetectError;
use image::{DynamicImage, GrayImage, Luma};

/// Adaptive threshold parameters: 11-pixel Gaussian window, constant
/// offset 2 below the local weighted mean.
const BLOCK_SIZE: u32 = 11;
const OFFSET: f32 = 2.0;
/// Gaussian sigma for an 11-pixel window
const SIGMA: f32 = 2.0;

/// Binarize with a Gaussian-weighted local threshold: a pixel stays white
/// when it exceeds the weighted neighborhood mean minus a constant offset.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, DetectError> {
    let gray = image.to_luma8();
    let binarized = adaptive_gaussian_threshold(&gray, BLOCK_SIZE, SIGMA, OFFSET);
    Ok(DynamicImage::ImageLuma8(binarized))
}

fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let half = (size / 2) as i32;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for w in kernel.iter_mut() {
        *w /= sum;
    }
    kernel
}

/// Separable Gaussian blur with replicated borders, then a per-pixel
/// comparison against the blurred mean.
fn adaptive_gaussian_threshold(
    img: &GrayImage,
    block_size: u32,
    sigma: f32,
    offset: f32,
) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }
    let kernel = gaussian_kernel(block_size, sigma);
    let half = (block_size / 2) as i64;

    // Horizontal pass
    let mut horizontal = vec![0.0f32; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = (x as i64 + k as i64 - half).clamp(0, width as i64 - 1) as u32;
                acc += weight * img.get_pixel(sx, y).0[0] as f32;
            }
            horizontal[(y * width + x) as usize] = acc;
        }
    }

    // Vertical pass and threshold
    GrayImage::from_fn(width, height, |x, y| {
        let mut mean = 0.0;
        for (k, weight) in kernel.iter().enumerate() {
            let sy = (y as i64 + k as i64 - half).clamp(0, height as i64 - 1) as u32;
            mean += weight * horizontal[(sy * width + x) as usize];
        }
        if img.get_pixel(x, y).0[0] as f32 > mean - offset {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}
