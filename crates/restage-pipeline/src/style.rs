//! Style transfer adapter seam.
//!
//! Styling is strictly optional: a run without a requested style skips
//! this step entirely and never touches a [`StyleTransfer`]
//! implementation. The adapter trait mirrors [`crate::detect::Detector`]
//! in shape so model hosting works the same way for both.

use image::RgbImage;

use crate::types::PipelineError;

/// A pretrained style transfer model.
///
/// `restyle` takes the inpainted room photo and returns a restyled
/// image of the same dimensions. Implementations must not mutate model
/// state between calls; identical inputs should yield identical
/// outputs.
///
/// # Contract
///
/// The output image must match the input dimensions. Inference
/// failures surface as [`PipelineError::ModelInference`] and abort the
/// whole run; no retries, no partial results.
pub trait StyleTransfer {
    /// Apply the model's style to `image`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ModelInference`] when inference fails
    /// or produces malformed output.
    fn restyle(&self, image: &RgbImage) -> Result<RgbImage, PipelineError>;
}

impl<S: StyleTransfer + ?Sized> StyleTransfer for &S {
    fn restyle(&self, image: &RgbImage) -> Result<RgbImage, PipelineError> {
        (**self).restyle(image)
    }
}
