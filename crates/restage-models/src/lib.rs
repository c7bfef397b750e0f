//! restage-models: pretrained model adapters for the restage pipeline.
//!
//! Wraps `.rten` model files behind the pipeline's [`Detector`] and
//! [`StyleTransfer`] seams. Weights are loaded once, up front; the
//! resulting adapters are cheap to borrow for any number of runs.
//!
//! The pipeline crate stays free of model runtime concerns; this crate
//! stays free of pipeline logic.

pub mod detector;
pub mod error;
pub mod styler;

pub use detector::FurnitureDetector;
pub use error::ModelError;
pub use styler::RoomStyler;

use std::path::Path;

use restage_pipeline::Adapters;

/// The loaded models a pipeline run needs, owned in one place.
///
/// Load once at startup, then borrow [`adapters`](Self::adapters) per
/// run. The styler is optional; without one, runs skip the style step.
pub struct ModelSet {
    detector: FurnitureDetector,
    styler: Option<RoomStyler>,
}

impl ModelSet {
    /// Load the furniture detector, with no styler.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Load`] when the detector file is missing
    /// or invalid.
    pub fn load(detector_path: &Path) -> Result<Self, ModelError> {
        Ok(Self {
            detector: FurnitureDetector::load(detector_path)?,
            styler: None,
        })
    }

    /// Attach a styler to the set.
    #[must_use]
    pub fn with_styler(mut self, styler: RoomStyler) -> Self {
        self.styler = Some(styler);
        self
    }

    /// Whether a styler is attached.
    #[must_use]
    pub const fn has_styler(&self) -> bool {
        self.styler.is_some()
    }

    /// Borrow the adapter bundle for a pipeline run.
    #[must_use]
    pub fn adapters(&self) -> Adapters<'_> {
        let adapters = Adapters::new(&self.detector);
        match &self.styler {
            Some(styler) => adapters.with_styler(styler),
            None => adapters,
        }
    }
}
