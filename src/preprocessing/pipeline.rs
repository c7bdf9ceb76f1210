use crate::error::DetectError;
use image::DynamicImage;
use std::time::Instant;

use super::steps;

/// Timing information for a single preprocessing step
#[derive(Debug, Clone)]
pub struct StepTiming {
    pub name: &'static str,
    pub time_ms: u64,
}

/// Result of preprocessing including timing stats
#[derive(Debug, Clone)]
pub struct PreprocessingResult {
    /// Normalized image
    pub image: DynamicImage,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

/// Run the full normalization sequence: deskew, contrast enhancement,
/// sharpen, grayscale, adaptive binarization, morphological cleanup.
pub fn process(image: DynamicImage) -> Result<PreprocessingResult, DetectError> {
    let start = Instant::now();
    let mut timings = Vec::new();

    let mut img = image;
    img = run_step("deskew", img, &mut timings, steps::deskew::apply)?;
    img = run_step("contrast", img, &mut timings, steps::contrast::apply)?;
    img = run_step("sharpen", img, &mut timings, steps::sharpen::apply)?;
    img = run_step("grayscale", img, &mut timings, steps::grayscale::apply)?;
    img = run_step("binarize", img, &mut timings, steps::binarize::apply)?;
    img = run_step("morphology", img, &mut timings, steps::morphology::apply)?;

    Ok(PreprocessingResult {
        image: img,
        total_time_ms: start.elapsed().as_millis() as u64,
        steps: timings,
    })
}

fn run_step<F>(
    name: &'static str,
    img: DynamicImage,
    timings: &mut Vec<StepTiming>,
    step_fn: F,
) -> Result<DynamicImage, DetectError>
where
    F: FnOnce(DynamicImage) -> Result<DynamicImage, DetectError>,
{
    let step_start = Instant::now();
    let result = step_fn(img)?;
    timings.push(StepTiming {
        name,
        time_ms: step_start.elapsed().as_millis() as u64,
    });
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn label_photo() -> DynamicImage {
        // Dark background with a bright panel, like a package face
        let mut img = RgbImage::from_pixel(120, 80, Rgb([15, 15, 15]));
        for y in 20..60 {
            for x in 20..100 {
                img.put_pixel(x, y, Rgb([235, 235, 235]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_process_runs_all_steps() {
        let result = process(label_photo()).unwrap();
        let names: Vec<&str> = result.steps.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "deskew",
                "contrast",
                "sharpen",
                "grayscale",
                "binarize",
                "morphology"
            ]
        );
    }

    #[test]
    fn test_process_outputs_binary_image_with_same_dimensions() {
        let result = process(label_photo()).unwrap();
        assert_eq!(result.image.width(), 120);
        assert_eq!(result.image.height(), 80);

        for pixel in result.image.to_luma8().pixels() {
            assert!(pixel.0[0] == 0 || pixel.0[0] == 255);
        }
    }

    #[test]
    fn test_process_fails_on_featureless_image() {
        let img = RgbImage::from_pixel(60, 60, Rgb([0, 0, 0]));
        let result = process(DynamicImage::ImageRgb8(img));
        assert!(matches!(result, Err(DetectError::Preprocessing(_))));
    }
}
