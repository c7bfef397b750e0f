//! Occupancy mask building: rasterize detection boxes into a binary
//! mask the size of the source photo.
//!
//! Pure and deterministic — no I/O, no model calls. Boxes partly
//! outside the frame are clamped, never dropped and never an error;
//! overlapping boxes simply union their foreground pixels.

use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;

use crate::types::{BoundingBox, Dimensions, Mask};

/// Rasterize `boxes` into a binary mask of the given size.
///
/// A pixel is foreground iff it falls inside at least one box after
/// clamping to `[0, width) x [0, height)`. An empty box set yields an
/// all-background mask. Boxes whose clamp is degenerate (fully outside
/// the frame, or inverted coordinates) contribute no pixels.
#[must_use = "returns the rasterized occupancy mask"]
pub fn build_mask(boxes: &[BoundingBox], dimensions: Dimensions) -> Mask {
    let mut mask = Mask::all_background(dimensions);

    for bbox in boxes {
        let Some((xs, ys)) = bbox.clamp_to(dimensions) else {
            continue;
        };
        for y in ys {
            for x in xs.clone() {
                mask.set_foreground(x, y);
            }
        }
    }

    mask
}

/// Grow a mask outward by `margin` pixels (L∞ dilation, i.e. a square
/// structuring element, matching the axis-aligned box geometry).
///
/// Detector boxes tend to sit tight against object edges; growing the
/// mask lets inpainting catch shadows and fringes. A margin of zero
/// returns the mask unchanged.
#[must_use = "returns the grown mask"]
pub fn grow(mask: Mask, margin: u32) -> Mask {
    if margin == 0 || mask.is_all_background() {
        return mask;
    }
    // imageproc's dilate radius is a u8; larger margins are saturated.
    let k = u8::try_from(margin).unwrap_or(u8::MAX);
    Mask::from_image(dilate(mask.as_image(), Norm::LInf, k))
}
