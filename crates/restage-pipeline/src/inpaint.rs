//! Classical inpainting: reconstruct masked regions from surrounding
//! pixel context.
//!
//! Masked pixels are filled layer by layer from the region boundary
//! inward. Each layer consists of every unknown pixel with at least one
//! known 8-neighbor; its new value is the inverse-distance-weighted
//! average of the known pixels inside a `(2*radius + 1)` square window.
//! A whole layer is computed against the state before the layer began,
//! so results are independent of pixel visit order and therefore fully
//! deterministic.
//!
//! No model is involved; this is the pipeline's only image synthesis
//! done in-crate.

use image::RgbImage;

use crate::types::{Dimensions, Mask, PipelineError};

/// Fill value when a mask covers the entire image and no known pixel
/// exists to diffuse from.
const NEUTRAL_FILL: u8 = 128;

/// Reconstruct the masked regions of `image` from surrounding pixels.
///
/// The output equals the input exactly wherever the mask is background;
/// an all-background mask returns a byte-identical copy. Deterministic
/// given the same image, mask, and radius.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionMismatch`] when the mask size
/// differs from the image size — the region is never truncated or
/// stretched to compensate. Returns [`PipelineError::InvalidConfig`]
/// when `radius` is zero.
pub fn inpaint(image: &RgbImage, mask: &Mask, radius: u32) -> Result<RgbImage, PipelineError> {
    if radius == 0 {
        return Err(PipelineError::InvalidConfig(
            "inpaint radius must be at least 1".to_string(),
        ));
    }

    let dims = Dimensions::of(image);
    if mask.dimensions() != dims {
        return Err(PipelineError::DimensionMismatch {
            image: dims,
            mask: mask.dimensions(),
        });
    }

    if mask.is_all_background() {
        return Ok(image.clone());
    }

    let width = dims.width as usize;
    let height = dims.height as usize;

    let mut output = image.clone();
    let mut known: Vec<bool> = Vec::with_capacity(width * height);
    for y in 0..dims.height {
        for x in 0..dims.width {
            known.push(!mask.is_foreground(x, y));
        }
    }

    let window = window_offsets(radius);

    // Unknown pixels remaining to fill, in fixed scan order.
    let mut remaining: Vec<(usize, usize)> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .filter(|&(x, y)| !known[y * width + x])
        .collect();

    while !remaining.is_empty() {
        // Current layer: unknown pixels touching the known region.
        let layer: Vec<(usize, usize)> = remaining
            .iter()
            .copied()
            .filter(|&(x, y)| has_known_neighbor(&known, width, height, x, y))
            .collect();

        if layer.is_empty() {
            // No known pixel anywhere (mask covered the whole frame):
            // fill the rest with a neutral value and stop.
            for &(x, y) in &remaining {
                #[allow(clippy::cast_possible_truncation)]
                output.put_pixel(
                    x as u32,
                    y as u32,
                    image::Rgb([NEUTRAL_FILL, NEUTRAL_FILL, NEUTRAL_FILL]),
                );
            }
            break;
        }

        // Compute every layer pixel from the pre-layer state.
        let filled: Vec<(usize, usize, image::Rgb<u8>)> = layer
            .iter()
            .map(|&(x, y)| {
                let value = weighted_fill(&output, &known, &window, width, height, x, y);
                (x, y, value)
            })
            .collect();

        for (x, y, value) in filled {
            #[allow(clippy::cast_possible_truncation)]
            output.put_pixel(x as u32, y as u32, value);
            known[y * width + x] = true;
        }

        remaining.retain(|&(x, y)| !known[y * width + x]);
    }

    Ok(output)
}

/// Precomputed window offsets with inverse-distance weights.
///
/// The center offset is excluded (distance zero is the pixel itself).
fn window_offsets(radius: u32) -> Vec<(i64, i64, f64)> {
    let r = i64::from(radius);
    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx == 0 && dy == 0 {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let dist = ((dx * dx + dy * dy) as f64).sqrt();
            offsets.push((dx, dy, 1.0 / dist));
        }
    }
    offsets
}

/// Whether any 8-neighbor of `(x, y)` is known.
fn has_known_neighbor(known: &[bool], width: usize, height: usize, x: usize, y: usize) -> bool {
    for dy in -1_i64..=1 {
        for dx in -1_i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i64 + dx;
            let ny = y as i64 + dy;
            if nx < 0 || ny < 0 {
                continue;
            }
            #[allow(clippy::cast_sign_loss)]
            let (nx, ny) = (nx as usize, ny as usize);
            if nx < width && ny < height && known[ny * width + nx] {
                return true;
            }
        }
    }
    false
}

/// Inverse-distance-weighted average of known window pixels.
///
/// Callers guarantee at least one known neighbor exists within the
/// window (the layer construction checks the 8-neighborhood, which is
/// a subset of any window with `radius >= 1`).
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn weighted_fill(
    output: &RgbImage,
    known: &[bool],
    window: &[(i64, i64, f64)],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
) -> image::Rgb<u8> {
    let mut acc = [0.0_f64; 3];
    let mut total_weight = 0.0_f64;

    for &(dx, dy, weight) in window {
        let nx = x as i64 + dx;
        let ny = y as i64 + dy;
        if nx < 0 || ny < 0 {
            continue;
        }
        let (nx, ny) = (nx as usize, ny as usize);
        if nx >= width || ny >= height || !known[ny * width + nx] {
            continue;
        }
        let pixel = output.get_pixel(nx as u32, ny as u32);
        for (channel, value) in acc.iter_mut().zip(pixel.0) {
            *channel += weight * f64::from(value);
        }
        total_weight += weight;
    }

    if total_weight <= f64::EPSILON {
        return image::Rgb([NEUTRAL_FILL, NEUTRAL_FILL, NEUTRAL_FILL]);
    }

    let mut rgb = [0_u8; 3];
    for (out, channel) in rgb.iter_mut().zip(acc) {
        *out = (channel / total_weight).round().clamp(0.0, 255.0) as u8;
    }
    image::Rgb(rgb)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mask::build_mask;
    use crate::types::BoundingBox;

    fn uniform(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, image::Rgb(rgb))
    }

    #[test]
    fn all_background_mask_is_identity() {
        let img = uniform(20, 20, [40, 80, 120]);
        let mask = Mask::all_background(Dimensions::of(&img));
        let result = inpaint(&img, &mask, 3).unwrap();
        assert_eq!(img.as_raw(), result.as_raw());
    }

    #[test]
    fn mismatched_mask_size_always_fails() {
        let img = uniform(20, 20, [0, 0, 0]);
        let mask = Mask::all_background(Dimensions {
            width: 10,
            height: 20,
        });
        let result = inpaint(&img, &mask, 3);
        assert!(matches!(
            result,
            Err(PipelineError::DimensionMismatch { .. }),
        ));
    }

    #[test]
    fn zero_radius_is_rejected() {
        let img = uniform(10, 10, [0, 0, 0]);
        let mask = Mask::all_background(Dimensions::of(&img));
        let result = inpaint(&img, &mask, 0);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn hole_in_uniform_image_fills_with_surrounding_color() {
        let mut img = uniform(20, 20, [100, 150, 200]);
        // Scribble garbage inside the region that will be masked; it
        // must not leak into the reconstruction.
        for y in 8..12 {
            for x in 8..12 {
                img.put_pixel(x, y, image::Rgb([255, 0, 255]));
            }
        }
        let boxes = vec![BoundingBox::new(8, 8, 12, 12, "chair", 0.9)];
        let mask = build_mask(&boxes, Dimensions::of(&img));

        let result = inpaint(&img, &mask, 3).unwrap();
        for pixel in result.pixels() {
            assert_eq!(pixel, &image::Rgb([100, 150, 200]));
        }
    }

    #[test]
    fn unmasked_pixels_are_untouched() {
        let mut img = uniform(16, 16, [10, 20, 30]);
        img.put_pixel(0, 0, image::Rgb([250, 240, 230]));
        let boxes = vec![BoundingBox::new(6, 6, 10, 10, "tv", 0.9)];
        let mask = build_mask(&boxes, Dimensions::of(&img));

        let result = inpaint(&img, &mask, 2).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                if !mask.is_foreground(x, y) {
                    assert_eq!(result.get_pixel(x, y), img.get_pixel(x, y));
                }
            }
        }
    }

    #[test]
    fn inpaint_is_deterministic() {
        let mut img = uniform(24, 24, [60, 60, 60]);
        for (i, pixel) in img.pixels_mut().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let v = (i % 251) as u8;
            *pixel = image::Rgb([v, v.wrapping_add(30), v.wrapping_mul(2)]);
        }
        let boxes = vec![BoundingBox::new(5, 5, 18, 18, "sofa", 0.9)];
        let mask = build_mask(&boxes, Dimensions::of(&img));

        let a = inpaint(&img, &mask, 3).unwrap();
        let b = inpaint(&img, &mask, 3).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn whole_frame_mask_fills_with_neutral_value() {
        let img = uniform(8, 8, [200, 10, 10]);
        let boxes = vec![BoundingBox::new(0, 0, 8, 8, "bed", 0.9)];
        let mask = build_mask(&boxes, Dimensions::of(&img));

        let result = inpaint(&img, &mask, 3).unwrap();
        for pixel in result.pixels() {
            assert_eq!(pixel, &image::Rgb([NEUTRAL_FILL; 3]));
        }
    }

    #[test]
    fn output_dimensions_match_input() {
        let img = uniform(13, 7, [1, 2, 3]);
        let boxes = vec![BoundingBox::new(2, 2, 5, 5, "chair", 0.9)];
        let mask = build_mask(&boxes, Dimensions::of(&img));
        let result = inpaint(&img, &mask, 1).unwrap();
        assert_eq!(result.dimensions(), img.dimensions());
    }
}
