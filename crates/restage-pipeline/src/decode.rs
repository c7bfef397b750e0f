//! Photo decoding and validation.
//!
//! Accepts raw photo bytes (PNG, JPEG, BMP, WebP) and produces the
//! 3-channel RGB image the rest of the pipeline operates on.
//!
//! This is the first step in the pipeline: raw bytes in, `RgbImage` out.

use image::RgbImage;

use crate::types::PipelineError;

/// Decode raw photo bytes into a 3-channel RGB image.
///
/// Supports PNG, JPEG, BMP, and WebP (whatever the `image` crate can
/// decode). Alpha channels and grayscale sources are converted to RGB.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
/// Returns [`PipelineError::InvalidImage`] if the decoded image has
/// zero area.
pub fn decode_photo(bytes: &[u8]) -> Result<RgbImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?.to_rgb8();
    if img.width() == 0 || img.height() == 0 {
        return Err(PipelineError::InvalidImage(
            "decoded image has zero area".to_string(),
        ));
    }
    Ok(img)
}
