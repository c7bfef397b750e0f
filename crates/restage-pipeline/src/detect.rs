//! Detector adapter seam.
//!
//! The pipeline treats object detection as an opaque call into a
//! pretrained model behind the [`Detector`] trait. Concrete adapters
//! (e.g. the `rten`-backed furniture detector in `restage-models`)
//! implement it; tests substitute deterministic fakes.

use image::RgbImage;

use crate::types::{BoundingBox, PipelineError};

/// A pretrained object detector.
///
/// Implementations are stateless per call: `detect` must not mutate
/// model state, and identical inputs should yield identical outputs.
/// Model weights are expected to be loaded once by the hosting process
/// and injected, not loaded per call.
///
/// # Contract
///
/// The input is always a non-empty 3-channel image (the pipeline
/// validates this at decode time). A single inference failure — for
/// example a malformed output tensor — must surface as
/// [`PipelineError::ModelInference`]; the pipeline aborts the run and
/// shows no partial results. Adapters perform no retries.
pub trait Detector {
    /// Detect objects in `image`, returning zero or more boxes in
    /// source image coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ModelInference`] when inference fails
    /// or produces malformed output.
    fn detect(&self, image: &RgbImage) -> Result<Vec<BoundingBox>, PipelineError>;
}

impl<D: Detector + ?Sized> Detector for &D {
    fn detect(&self, image: &RgbImage) -> Result<Vec<BoundingBox>, PipelineError> {
        (**self).detect(image)
    }
}

/// Drop detections scoring below `threshold`.
///
/// Relative order of the survivors is preserved, so re-running with
/// identical inputs yields an identical result.
#[must_use]
pub fn filter_by_score(detections: Vec<BoundingBox>, threshold: f32) -> Vec<BoundingBox> {
    detections
        .into_iter()
        .filter(|d| d.score >= threshold)
        .collect()
}
