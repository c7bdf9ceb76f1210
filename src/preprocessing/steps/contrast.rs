use crate::error::DetectError;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::equalize_histogram;
use palette::{IntoColor, Lab, Srgb};

/// CLAHE tile grid and clip limit
const TILES_X: u32 = 8;
const TILES_Y: u32 = 8;
const CLIP_LIMIT: f32 = 3.0;

/// Boost contrast on the luminance channel, leaving chroma untouched:
/// CLAHE over a tile grid, then a global equalization pass, both applied to
/// the Lab L channel before converting back.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, DetectError> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut luma = GrayImage::new(width, height);
    let mut chroma = Vec::with_capacity((width * height) as usize);
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let lab: Lab = Srgb::new(
            pixel.0[0] as f32 / 255.0,
            pixel.0[1] as f32 / 255.0,
            pixel.0[2] as f32 / 255.0,
        )
        .into_color();
        let l = (lab.l / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8;
        luma.put_pixel(x, y, Luma([l]));
        chroma.push((lab.a, lab.b));
    }

    let equalized = clahe(&luma, TILES_X, TILES_Y, CLIP_LIMIT);
    let equalized = equalize_histogram(&equalized);

    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in equalized.enumerate_pixels() {
        let (a, b) = chroma[(y * width + x) as usize];
        let l = pixel.0[0] as f32 / 255.0 * 100.0;
        let srgb: Srgb = Lab::new(l, a, b).into_color();
        out.put_pixel(
            x,
            y,
            Rgb([
                (srgb.red * 255.0).round().clamp(0.0, 255.0) as u8,
                (srgb.green * 255.0).round().clamp(0.0, 255.0) as u8,
                (srgb.blue * 255.0).round().clamp(0.0, 255.0) as u8,
            ]),
        );
    }

    Ok(DynamicImage::ImageRgb8(out))
}

/// Contrast-limited adaptive histogram equalization.
///
/// Each tile gets a clipped-histogram equalization lookup table; pixels are
/// mapped by bilinear interpolation between the four surrounding tile
/// tables to avoid visible seams.
fn clahe(img: &GrayImage, tiles_x: u32, tiles_y: u32, clip_limit: f32) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let tile_w = width.div_ceil(tiles_x).max(1);
    let tile_h = height.div_ceil(tiles_y).max(1);
    let grid_x = width.div_ceil(tile_w);
    let grid_y = height.div_ceil(tile_h);

    let mut luts = vec![[0u8; 256]; (grid_x * grid_y) as usize];
    for ty in 0..grid_y {
        for tx in 0..grid_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[img.get_pixel(x, y).0[0] as usize] += 1;
                }
            }

            let area = ((x1 - x0) * (y1 - y0)) as f32;
            let clip = ((clip_limit * area / 256.0) as u32).max(1);

            // Clip the histogram and spread the excess evenly, keeping the
            // total mass so the lookup table still reaches full range
            let mut excess = 0u32;
            for count in hist.iter_mut() {
                if *count > clip {
                    excess += *count - clip;
                    *count = clip;
                }
            }
            let bonus = excess / 256;
            let residual = (excess % 256) as usize;
            for (value, count) in hist.iter_mut().enumerate() {
                *count += bonus;
                if value < residual {
                    *count += 1;
                }
            }

            let lut = &mut luts[(ty * grid_x + tx) as usize];
            let scale = 255.0 / area;
            let mut cumulative = 0u32;
            for (value, count) in hist.iter().enumerate() {
                cumulative += count;
                lut[value] = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    let clamp_tile = |t: f32, max: u32| -> u32 {
        if t < 0.0 {
            0
        } else {
            (t as u32).min(max)
        }
    };

    GrayImage::from_fn(width, height, |x, y| {
        let value = img.get_pixel(x, y).0[0] as usize;

        // Position in tile-center space
        let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let wx = fx - fx.floor();
        let wy = fy - fy.floor();

        let tx0 = clamp_tile(fx.floor(), grid_x - 1);
        let tx1 = clamp_tile(fx.floor() + 1.0, grid_x - 1);
        let ty0 = clamp_tile(fy.floor(), grid_y - 1);
        let ty1 = clamp_tile(fy.floor() + 1.0, grid_y - 1);

        let v00 = luts[(ty0 * grid_x + tx0) as usize][value] as f32;
        let v10 = luts[(ty0 * grid_x + tx1) as usize][value] as f32;
        let v01 = luts[(ty1 * grid_x + tx0) as usize][value] as f32;
        let v11 = luts[(ty1 * grid_x + tx1) as usize][value] as f32;

        let top = v00 + (v10 - v00) * wx;
        let bottom = v01 + (v11 - v01) * wx;
        Luma([(top + (bottom - top) * wy).round().clamp(0.0, 255.0) as u8])
    })
}
