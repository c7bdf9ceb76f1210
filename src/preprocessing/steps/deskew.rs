use crate::error::DetectError;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::contours::find_contours;
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;

/// Straighten a tilted photo using the orientation of its largest
/// foreground contour.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, DetectError> {
    let gray = image.to_luma8();
    let level = otsu_level(&gray);
    let binary = threshold(&gray, level, ThresholdType::Binary);

    let contours = find_contours::<i32>(&binary);
    let largest = contours
        .iter()
        .filter(|c| c.parent.is_none())
        .max_by(|a, b| {
            contour_area(&a.points)
                .partial_cmp(&contour_area(&b.points))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .ok_or_else(|| {
            DetectError::Preprocessing("no foreground contour found for deskew".to_string())
        })?;

    let corners = min_area_rect(&largest.points);
    let rotation = rotation_for_angle(rect_angle(&corners));

    // Negligible tilt, skip the warp
    if rotation.abs() < 0.1 {
        return Ok(image);
    }

    let rotated = rotate_about_center_replicate(&image.to_rgb8(), rotation);
    Ok(DynamicImage::ImageRgb8(rotated))
}

/// Polygon area of a contour (shoelace formula).
fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0i64;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        sum += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (sum as f64 / 2.0).abs()
}

/// Angle of a minimum-area rectangle edge in degrees, reduced into
/// [-90, 0). Axis-aligned rectangles come out as -90.
fn rect_angle(corners: &[Point<i32>; 4]) -> f32 {
    let dx = (corners[1].x - corners[0].x) as f32;
    let dy = (corners[1].y - corners[0].y) as f32;
    let mut angle = dy.atan2(dx).to_degrees() % 90.0;
    if angle > 0.0 {
        angle -= 90.0;
    }
    if angle == 0.0 {
        angle = -90.0;
    }
    angle
}

/// Map a raw rectangle angle to the rotation that undoes the tilt. Angles
/// below -45 are reflected so the correction never exceeds 45 degrees in
/// either direction.
fn rotation_for_angle(angle: f32) -> f32 {
    if angle < -45.0 {
        -(90.0 + angle)
    } else {
        -angle
    }
}

/// Rotate about the image center with bilinear sampling, clamping source
/// coordinates so newly exposed borders replicate the edge pixels. Output
/// has the same dimensions as the input.
fn rotate_about_center_replicate(img: &RgbImage, angle_deg: f32) -> RgbImage {
    let (width, height) = img.dimensions();
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let (sin, cos) = angle_deg.to_radians().sin_cos();

    RgbImage::from_fn(width, height, |x, y| {
        // Inverse mapping: where in the source does this output pixel land
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let sx = cos * dx - sin * dy + cx;
        let sy = sin * dx + cos * dy + cy;
        sample_bilinear_clamped(img, sx, sy)
    })
}

fn sample_bilinear_clamped(img: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (width, height) = img.dimensions();
    let x = x.clamp(0.0, (width - 1) as f32);
    let y = y.clamp(0.0, (height - 1) as f32);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let mut channels = [0u8; 3];
    for (c, channel) in channels.iter_mut().enumerate() {
        let p00 = img.get_pixel(x0, y0).0[c] as f32;
        let p10 = img.get_pixel(x1, y0).0[c] as f32;
        let p01 = img.get_pixel(x0, y1).0[c] as f32;
        let p11 = img.get_pixel(x1, y1).0[c] as f32;
        let top = p00 + (p10 - p00) * fx;
        let bottom = p01 + (p11 - p01) * fx;
        *channel = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(channels)
}
