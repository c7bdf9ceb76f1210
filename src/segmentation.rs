use image::DynamicImage;
use imageproc::contours::find_contours;
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::point::Point;

/// Bounding boxes at or below these sizes are treated as noise. Both
/// comparisons are strict: a 50x15 box is rejected, a 51x16 box is kept.
const MIN_REGION_WIDTH: u32 = 50;
const MIN_REGION_HEIGHT: u32 = 15;

/// A rectangular crop believed to contain text
#[derive(Debug, Clone)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub pixels: DynamicImage,
}

/// Find candidate text regions: Otsu-binarize, trace external contours,
/// keep bounding boxes larger than the noise floor, return the crops.
///
/// Regions may overlap and carry no meaningful order; zero regions is a
/// valid result and must not be treated as an error downstream.
pub fn segment(image: &DynamicImage) -> Vec<Region> {
    let gray = image.to_luma8();
    let level = otsu_level(&gray);
    let binary = threshold(&gray, level, ThresholdType::Binary);

    find_contours::<i32>(&binary)
        .iter()
        .filter(|contour| contour.parent.is_none())
        .filter_map(|contour| bounding_box(&contour.points))
        .filter(|&(_, _, w, h)| w > MIN_REGION_WIDTH && h > MIN_REGION_HEIGHT)
        .map(|(x, y, width, height)| Region {
            x,
            y,
            width,
            height,
            pixels: image.crop_imm(x, y, width, height),
        })
        .collect()
}

/// Axis-aligned bounding box of a contour as (x, y, width, height)
fn bounding_box(points: &[Point<i32>]) -> Option<(u32, u32, u32, u32)> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some((
        min_x as u32,
        min_y as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}
