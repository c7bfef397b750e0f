//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process_staged`] which runs the entire pipeline in one
//! call, [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use restage_pipeline::{Pipeline, PipelineConfig, PipelineError};
//! # use restage_pipeline::{Detector, StyleTransfer};
//! # fn run(
//! #     png: Vec<u8>,
//! #     detector: &dyn Detector,
//! #     styler: &dyn StyleTransfer,
//! # ) -> Result<(), PipelineError> {
//! let config = PipelineConfig::default();
//! let pipeline = Pipeline::new(png, config)
//!     .decode()?
//!     .detect(detector)?
//!     .build_mask()
//!     .inpaint()?
//!     .restyle(Some(styler))?;
//!
//! let staged = pipeline.into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), carrying all previously computed
//! intermediates. The caller can inspect the current stage's output via
//! accessor methods at any point. A failed transition returns `Err` and
//! drops the run; there is no partial result to recover.
//!
//! Styling is optional: pass `None` to [`Inpainted::restyle`] and the
//! pipeline completes without ever touching a style adapter.
//!
//! # Memory
//!
//! Every stage retains the full original photo, and later stages add the
//! mask and the inpainted copy. For a 12-megapixel photo that is roughly
//! 85 MB pinned until [`Styled::into_result`] consumes the final stage.
//! This is intentional: [`StagedResult`] keeps every intermediate for
//! visualization and export. Callers that only need the final image
//! should prefer [`crate::process`], which discards intermediates.

use image::RgbImage;

use crate::detect::Detector;
use crate::diagnostics::StageMetrics;
use crate::style::StyleTransfer;
use crate::types::{
    BoundingBox, Dimensions, Mask, PipelineConfig, PipelineError, StagedResult,
};

/// Model adapters a pipeline run needs, bundled for the dynamic
/// [`Stage`] API.
///
/// The typed API takes the detector and styler at the stages that use
/// them; the loopable [`Stage`] API instead receives this bundle at
/// every call and picks what it needs. `styler` left as `None` means
/// the styling step is skipped.
#[derive(Clone, Copy)]
pub struct Adapters<'a> {
    detector: &'a dyn Detector,
    styler: Option<&'a dyn StyleTransfer>,
}

impl<'a> Adapters<'a> {
    /// Bundle a detector with no styler; styling will be skipped.
    pub const fn new(detector: &'a dyn Detector) -> Self {
        Self {
            detector,
            styler: None,
        }
    }

    /// Add a styler to the bundle.
    #[must_use]
    pub const fn with_styler(mut self, styler: &'a dyn StyleTransfer) -> Self {
        self.styler = Some(styler);
        self
    }

    /// The detector in this bundle.
    #[must_use]
    pub const fn detector(&self) -> &'a dyn Detector {
        self.detector
    }

    /// The styler in this bundle, if any.
    #[must_use]
    pub const fn styler(&self) -> Option<&'a dyn StyleTransfer> {
        self.styler
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// The source photo bytes and config are stored but not yet touched.
/// Call [`decode`](Self::decode) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .decode() to continue"]
pub struct Pending {
    config: PipelineConfig,
    source: Vec<u8>,
}

impl Pending {
    /// The raw source photo bytes.
    #[must_use]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Decode the source photo and advance to the [`Received`] stage.
    ///
    /// Also validates the config; an invalid config fails here, before
    /// any pixel work.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if the config is out of
    /// range, [`PipelineError::EmptyInput`] if the source bytes are
    /// empty, [`PipelineError::ImageDecode`] if the image format is
    /// unrecognized or the data is corrupt, and
    /// [`PipelineError::InvalidImage`] for a zero-area image.
    pub fn decode(self) -> Result<Received, PipelineError> {
        self.config.validate()?;
        let source_len = self.source.len();
        let original = crate::decode::decode_photo(&self.source)?;
        let dimensions = Dimensions::of(&original);
        Ok(Received {
            config: self.config,
            original,
            source_len,
            dimensions,
        })
    }
}

// ───────────────────────── Stage 1: Received ─────────────────────────

/// Pipeline state after decoding the source photo.
///
/// The raw bytes have been decoded into a 3-channel RGB image. Whether
/// the photo arrived by upload or camera capture makes no difference
/// from here on. Call [`detect`](Self::detect) to advance.
#[must_use = "pipeline stages are consumed by advancing — call .detect() to continue"]
pub struct Received {
    config: PipelineConfig,
    original: RgbImage,
    source_len: usize,
    dimensions: Dimensions,
}

impl Received {
    /// The decoded room photo.
    #[must_use]
    pub const fn original(&self) -> &RgbImage {
        &self.original
    }

    /// Run furniture detection and advance to the [`Detected`] stage.
    ///
    /// Detections scoring below `config.score_threshold` are dropped.
    /// Zero detections is a valid outcome, not an error; the pipeline
    /// continues and later stages degrade to identity.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ModelInference`] when the detector
    /// fails. The run aborts; no partial results are kept.
    pub fn detect(self, detector: &dyn Detector) -> Result<Detected, PipelineError> {
        let raw = detector.detect(&self.original)?;
        let raw_count = raw.len();
        let detections = crate::detect::filter_by_score(raw, self.config.score_threshold);
        Ok(Detected {
            config: self.config,
            original: self.original,
            detections,
            raw_count,
            dimensions: self.dimensions,
        })
    }
}

// ───────────────────────── Stage 2: Detected ─────────────────────────

/// Pipeline state after furniture detection and score filtering.
///
/// Call [`build_mask`](Self::build_mask) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .build_mask() to continue"]
pub struct Detected {
    config: PipelineConfig,
    original: RgbImage,
    detections: Vec<BoundingBox>,
    raw_count: usize,
    dimensions: Dimensions,
}

impl Detected {
    /// The detections that survived the score filter, in detector order.
    #[must_use]
    pub fn detections(&self) -> &[BoundingBox] {
        &self.detections
    }

    /// Rasterize the detections into an occupancy mask and advance to
    /// the [`Masked`] stage.
    ///
    /// Boxes partly outside the frame are clamped; an empty detection
    /// set yields an all-background mask. When `config.mask_margin` is
    /// nonzero the mask is grown outward by that many pixels.
    pub fn build_mask(self) -> Masked {
        let mask = crate::mask::build_mask(&self.detections, self.dimensions);
        let mask = crate::mask::grow(mask, self.config.mask_margin);
        Masked {
            config: self.config,
            original: self.original,
            detections: self.detections,
            raw_count: self.raw_count,
            mask,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 3: Masked ───────────────────────────

/// Pipeline state after mask rasterization (and optional margin growth).
///
/// Call [`inpaint`](Self::inpaint) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing — call .inpaint() to continue"]
pub struct Masked {
    config: PipelineConfig,
    original: RgbImage,
    detections: Vec<BoundingBox>,
    raw_count: usize,
    mask: Mask,
    dimensions: Dimensions,
}

impl Masked {
    /// The binary occupancy mask, margin growth already applied.
    #[must_use]
    pub const fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Reconstruct the masked regions and advance to the [`Inpainted`]
    /// stage.
    ///
    /// An all-background mask (nothing detected) makes this an exact
    /// identity copy of the original.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when
    /// `config.inpaint_radius` is zero. The mask is built from the same
    /// dimensions as the image, so the dimension check cannot fail from
    /// this path.
    pub fn inpaint(self) -> Result<Inpainted, PipelineError> {
        let inpainted =
            crate::inpaint::inpaint(&self.original, &self.mask, self.config.inpaint_radius)?;
        Ok(Inpainted {
            config: self.config,
            original: self.original,
            detections: self.detections,
            raw_count: self.raw_count,
            mask: self.mask,
            inpainted,
            dimensions: self.dimensions,
        })
    }
}

// ───────────────────────── Stage 4: Inpainted ────────────────────────

/// Pipeline state after furniture removal.
///
/// Call [`restyle`](Self::restyle) to advance to the final stage,
/// passing `None` to skip styling.
#[must_use = "pipeline stages are consumed by advancing — call .restyle() to continue"]
pub struct Inpainted {
    config: PipelineConfig,
    original: RgbImage,
    detections: Vec<BoundingBox>,
    raw_count: usize,
    mask: Mask,
    inpainted: RgbImage,
    dimensions: Dimensions,
}

impl Inpainted {
    /// The emptied room image.
    #[must_use]
    pub const fn inpainted(&self) -> &RgbImage {
        &self.inpainted
    }

    /// Optionally restyle the emptied room and advance to the final
    /// [`Styled`] stage.
    ///
    /// With `None` the style step is skipped entirely; the adapter is
    /// never invoked and the final image is the inpainted one.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ModelInference`] when the styler fails
    /// or returns an image whose dimensions differ from the input.
    pub fn restyle(self, styler: Option<&dyn StyleTransfer>) -> Result<Styled, PipelineError> {
        let styled = match styler {
            None => None,
            Some(s) => {
                let out = s.restyle(&self.inpainted)?;
                if Dimensions::of(&out) != self.dimensions {
                    return Err(PipelineError::ModelInference(format!(
                        "style output is {}, input was {}",
                        Dimensions::of(&out),
                        self.dimensions,
                    )));
                }
                Some(out)
            }
        };
        Ok(Styled {
            config: self.config,
            original: self.original,
            detections: self.detections,
            raw_count: self.raw_count,
            mask: self.mask,
            inpainted: self.inpainted,
            styled,
            dimensions: self.dimensions,
        })
    }
}

// ───────────────────────── Stage 5: Styled ───────────────────────────

/// Pipeline state after optional style transfer — the final stage.
///
/// Call [`into_result`](Self::into_result) to extract the
/// [`StagedResult`] containing all intermediates.
#[must_use = "call .into_result() to extract the StagedResult"]
pub struct Styled {
    config: PipelineConfig,
    original: RgbImage,
    detections: Vec<BoundingBox>,
    raw_count: usize,
    mask: Mask,
    inpainted: RgbImage,
    styled: Option<RgbImage>,
    dimensions: Dimensions,
}

impl Styled {
    /// The styled image, or `None` if styling was skipped.
    #[must_use]
    pub const fn styled(&self) -> Option<&RgbImage> {
        self.styled.as_ref()
    }

    /// Image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Consume the pipeline and return the full [`StagedResult`].
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            original: self.original,
            detections: self.detections,
            mask: self.mask,
            inpainted: self.inpainted,
            styled: self.styled,
            dimensions: self.dimensions,
        }
    }
}

// ──────────────────── PipelineStage trait + Stage enum ────────────────

/// Total number of stages in the pipeline.
pub const STAGE_COUNT: usize = 6;

/// The output produced by a single pipeline stage.
///
/// Each variant borrows the data that the corresponding stage computed.
/// Use this with [`PipelineStage::output`] or [`Stage::output`] to
/// inspect intermediates in a uniform, type-erased way.
#[must_use]
pub enum StageOutput<'a> {
    /// Source photo bytes (not yet decoded).
    Source {
        /// The raw photo bytes.
        bytes: &'a [u8],
    },
    /// Decoded room photo.
    Received {
        /// The original photo.
        original: &'a RgbImage,
    },
    /// Furniture detection result, score filter already applied.
    Detected {
        /// The surviving detections.
        detections: &'a [BoundingBox],
    },
    /// Mask rasterization result.
    Masked {
        /// The binary occupancy mask.
        mask: &'a Mask,
    },
    /// Furniture removal result.
    Inpainted {
        /// The emptied room image.
        inpainted: &'a RgbImage,
    },
    /// Optional style transfer result.
    Styled {
        /// The styled image, or `None` if styling was skipped.
        styled: Option<&'a RgbImage>,
        /// Image dimensions.
        dimensions: Dimensions,
    },
}

/// Trait implemented by every pipeline stage, enabling uniform iteration.
///
/// Both the typed API (individual stage structs) and the dynamic API
/// ([`Stage`] enum) are available. This trait bridges the two: each
/// stage struct implements it, and [`Stage`] delegates to whichever
/// variant it holds. The dynamic methods take an [`Adapters`] bundle so
/// a single loop can drive model-backed stages without knowing which
/// one is next.
///
/// # Loop pattern
///
/// ```rust
/// # use restage_pipeline::{Pipeline, PipelineConfig, PipelineError, Detector};
/// # use restage_pipeline::pipeline::{Adapters, Stage, PipelineStage, Advance};
/// # fn run(png: Vec<u8>, detector: &dyn Detector) -> Result<(), PipelineError> {
/// let adapters = Adapters::new(detector);
/// let mut stage: Stage = Pipeline::new(png, PipelineConfig::default()).into();
/// loop {
///     match stage.advance(adapters)? {
///         Advance::Next(next) => stage = next,
///         Advance::Complete(done) => { stage = done; break; }
///     }
/// }
/// let result = stage.complete(adapters)?;
/// # Ok(())
/// # }
/// ```
pub trait PipelineStage: Sized {
    /// Human-readable name of this stage (e.g. `"source"`, `"detect"`).
    const NAME: &str;

    /// Zero-based index of this stage (`0` for Pending through `5` for
    /// Styled).
    const INDEX: usize;

    /// The output this stage produced.
    fn output(&self) -> StageOutput<'_>;

    /// Stage-specific metrics for diagnostics.
    ///
    /// Returns `None` for the initial [`Pending`] stage which has not
    /// yet performed any processing. All other stages return
    /// `Some(metrics)` describing the work done to reach this state.
    fn metrics(&self) -> Option<StageMetrics>;

    /// Advance to the next stage.
    ///
    /// Returns `Ok(Some(stage))` on success, `Ok(None)` if already at
    /// the final stage, or `Err` if the stage transition fails.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the stage transition fails.
    fn next(self, adapters: Adapters<'_>) -> Result<Option<Stage>, PipelineError>;

    /// Run all remaining stages to completion and return the final
    /// [`StagedResult`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any remaining fallible stage fails.
    fn complete(self, adapters: Adapters<'_>) -> Result<StagedResult, PipelineError>;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Source {
            bytes: &self.source,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }

    fn next(self, _adapters: Adapters<'_>) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Received(self.decode()?)))
    }

    fn complete(self, adapters: Adapters<'_>) -> Result<StagedResult, PipelineError> {
        self.decode()?.complete(adapters)
    }
}

impl PipelineStage for Received {
    const NAME: &str = "decode";
    const INDEX: usize = 1;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Received {
            original: &self.original,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Decode {
            input_bytes: self.source_len,
            width: self.dimensions.width,
            height: self.dimensions.height,
            pixel_count: self.dimensions.pixel_count(),
        })
    }

    fn next(self, adapters: Adapters<'_>) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Detected(self.detect(adapters.detector)?)))
    }

    fn complete(self, adapters: Adapters<'_>) -> Result<StagedResult, PipelineError> {
        self.detect(adapters.detector)?.complete(adapters)
    }
}

impl PipelineStage for Detected {
    const NAME: &str = "detect";
    const INDEX: usize = 2;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Detected {
            detections: &self.detections,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Detection {
            raw_count: self.raw_count,
            kept_count: self.detections.len(),
            score_threshold: self.config.score_threshold,
        })
    }

    fn next(self, _adapters: Adapters<'_>) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Masked(self.build_mask())))
    }

    fn complete(self, adapters: Adapters<'_>) -> Result<StagedResult, PipelineError> {
        self.build_mask().complete(adapters)
    }
}

impl PipelineStage for Masked {
    const NAME: &str = "mask";
    const INDEX: usize = 3;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Masked { mask: &self.mask }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Mask {
            box_count: self.detections.len(),
            foreground_pixels: self.mask.foreground_count(),
            total_pixels: self.dimensions.pixel_count(),
            margin: self.config.mask_margin,
        })
    }

    fn next(self, _adapters: Adapters<'_>) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Inpainted(self.inpaint()?)))
    }

    fn complete(self, adapters: Adapters<'_>) -> Result<StagedResult, PipelineError> {
        self.inpaint()?.complete(adapters)
    }
}

impl PipelineStage for Inpainted {
    const NAME: &str = "inpaint";
    const INDEX: usize = 4;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Inpainted {
            inpainted: &self.inpainted,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Inpaint {
            filled_pixels: self.mask.foreground_count(),
            radius: self.config.inpaint_radius,
        })
    }

    fn next(self, adapters: Adapters<'_>) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Styled(self.restyle(adapters.styler)?)))
    }

    fn complete(self, adapters: Adapters<'_>) -> Result<StagedResult, PipelineError> {
        Ok(self.restyle(adapters.styler)?.into_result())
    }
}

impl PipelineStage for Styled {
    const NAME: &str = "style";
    const INDEX: usize = 5;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Styled {
            styled: self.styled.as_ref(),
            dimensions: self.dimensions,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Style {
            applied: self.styled.is_some(),
        })
    }

    fn next(self, _adapters: Adapters<'_>) -> Result<Option<Stage>, PipelineError> {
        Ok(None)
    }

    fn complete(self, _adapters: Adapters<'_>) -> Result<StagedResult, PipelineError> {
        Ok(self.into_result())
    }
}

/// Enum wrapping all pipeline stages for uniform, loopable access.
///
/// Use [`From`] conversions to enter the dynamic API from any typed
/// stage, then call [`advance`](Self::advance) in a loop with an
/// [`Adapters`] bundle.
#[must_use]
pub enum Stage {
    /// See [`Pending`].
    Pending(Pending),
    /// See [`Received`].
    Received(Received),
    /// See [`Detected`].
    Detected(Detected),
    /// See [`Masked`].
    Masked(Masked),
    /// See [`Inpainted`].
    Inpainted(Inpainted),
    /// See [`Styled`].
    Styled(Styled),
}

/// Compile-time guard: if a [`Stage`] variant is added, this match becomes
/// non-exhaustive and the build fails — reminding you to bump [`STAGE_COUNT`].
#[allow(dead_code, clippy::match_same_arms)]
const fn _stage_count_guard(s: &Stage) {
    match s {
        Stage::Pending(_)
        | Stage::Received(_)
        | Stage::Detected(_)
        | Stage::Masked(_)
        | Stage::Inpainted(_)
        | Stage::Styled(_) => {}
    }
}

/// Result of [`Stage::advance`]: either the next stage or the
/// completed final stage returned unchanged.
#[must_use]
pub enum Advance {
    /// The pipeline advanced to this next stage.
    Next(Stage),
    /// The pipeline was already at the final stage — returned unchanged.
    Complete(Stage),
}

/// Delegate a method call to whichever `Stage` variant is active.
macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Self::Pending(s) => s.$method($($arg),*),
            Self::Received(s) => s.$method($($arg),*),
            Self::Detected(s) => s.$method($($arg),*),
            Self::Masked(s) => s.$method($($arg),*),
            Self::Inpainted(s) => s.$method($($arg),*),
            Self::Styled(s) => s.$method($($arg),*),
        }
    };
}

impl Stage {
    /// Human-readable name of the current stage.
    #[must_use]
    pub fn name(&self) -> &'static str {
        delegate!(self, name)
    }

    /// Zero-based index of the current stage.
    #[must_use]
    pub fn index(&self) -> usize {
        delegate!(self, index)
    }

    /// The output this stage produced.
    pub fn output(&self) -> StageOutput<'_> {
        delegate!(self, output)
    }

    /// Stage-specific metrics for diagnostics.
    ///
    /// Returns `None` for the initial `Pending` stage.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        delegate!(self, metrics)
    }

    /// Whether the pipeline is at the final stage.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Styled(_))
    }

    /// Advance to the next stage.
    ///
    /// Returns `Ok(Some(next_stage))` on success, `Ok(None)` if
    /// already complete (the `Styled` value is consumed), or `Err` if
    /// the transition fails.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a fallible stage transition fails.
    pub fn next(self, adapters: Adapters<'_>) -> Result<Option<Self>, PipelineError> {
        delegate!(self, next, adapters)
    }

    /// Advance to the next stage, returning `self` unchanged if
    /// already complete.
    ///
    /// This is the loop-friendly version of [`next`](Self::next).
    /// Unlike `next()`, which consumes the final stage and returns
    /// `Ok(None)`, `advance()` returns [`Advance::Complete`] with
    /// the final stage so you can still call
    /// [`complete`](Self::complete) on it.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a fallible stage transition fails.
    pub fn advance(self, adapters: Adapters<'_>) -> Result<Advance, PipelineError> {
        if self.is_complete() {
            return Ok(Advance::Complete(self));
        }
        // Non-complete stages always return Ok(Some(_)) from next().
        // The is_complete() guard above ensures we never reach None here.
        #[allow(clippy::unreachable)]
        let next = self
            .next(adapters)?
            .unwrap_or_else(|| unreachable!("non-complete stage returned None from next()"));
        Ok(Advance::Next(next))
    }

    /// Run all remaining stages to completion.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any remaining fallible stage fails.
    pub fn complete(self, adapters: Adapters<'_>) -> Result<StagedResult, PipelineError> {
        delegate!(self, complete, adapters)
    }
}

// Provide a private helper trait so the macro can call `.name()` and
// `.index()` on `&self` — the `PipelineStage` trait's associated
// constants aren't callable via `self.NAME`.
trait StageMetadata {
    fn name(&self) -> &'static str;
    fn index(&self) -> usize;
}

impl<T: PipelineStage> StageMetadata for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn index(&self) -> usize {
        T::INDEX
    }
}

impl From<Pending> for Stage {
    fn from(s: Pending) -> Self {
        Self::Pending(s)
    }
}

impl From<Received> for Stage {
    fn from(s: Received) -> Self {
        Self::Received(s)
    }
}

impl From<Detected> for Stage {
    fn from(s: Detected) -> Self {
        Self::Detected(s)
    }
}

impl From<Masked> for Stage {
    fn from(s: Masked) -> Self {
        Self::Masked(s)
    }
}

impl From<Inpainted> for Stage {
    fn from(s: Inpainted) -> Self {
        Self::Inpainted(s)
    }
}

impl From<Styled> for Stage {
    fn from(s: Styled) -> Self {
        Self::Styled(s)
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental furniture removal pipeline.
///
/// Created via [`Pipeline::new`], which stores the source photo and
/// config without doing any processing. The caller then chains stage
/// methods to advance through the pipeline:
///
/// ```rust
/// # use restage_pipeline::{Pipeline, PipelineConfig, PipelineError, Detector};
/// # fn run(png: Vec<u8>, detector: &dyn Detector) -> Result<(), PipelineError> {
/// let result = Pipeline::new(png, PipelineConfig::default())
///     .decode()?
///     .detect(detector)?
///     .build_mask()
///     .inpaint()?
///     .restyle(None)?
///     .into_result();
/// # Ok(())
/// # }
/// ```
///
/// Each stage method consumes the current state and returns the next,
/// making it a compile-time error to skip stages or call them out of
/// order.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from source photo bytes and config.
    ///
    /// No processing is performed — the bytes and config are simply
    /// stored. Call [`.decode()`](Pending::decode) (or convert to a
    /// [`Stage`] and loop) to begin processing.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(photo_bytes: Vec<u8>, config: PipelineConfig) -> Pending {
        Pending {
            config,
            source: photo_bytes,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// Detector returning a fixed set of boxes.
    struct FixedDetector(Vec<BoundingBox>);

    impl Detector for FixedDetector {
        fn detect(&self, _image: &RgbImage) -> Result<Vec<BoundingBox>, PipelineError> {
            Ok(self.0.clone())
        }
    }

    /// Detector that always fails.
    struct FailingDetector;

    impl Detector for FailingDetector {
        fn detect(&self, _image: &RgbImage) -> Result<Vec<BoundingBox>, PipelineError> {
            Err(PipelineError::ModelInference(
                "simulated inference failure".to_string(),
            ))
        }
    }

    /// Styler that tints the red channel and counts its invocations.
    struct TintStyler {
        calls: Cell<usize>,
    }

    impl TintStyler {
        const fn new() -> Self {
            Self {
                calls: Cell::new(0),
            }
        }
    }

    impl StyleTransfer for TintStyler {
        fn restyle(&self, image: &RgbImage) -> Result<RgbImage, PipelineError> {
            self.calls.set(self.calls.get() + 1);
            let mut out = image.clone();
            for pixel in out.pixels_mut() {
                pixel.0[0] = pixel.0[0].saturating_add(40);
            }
            Ok(out)
        }
    }

    /// Styler that returns the wrong dimensions.
    struct BrokenStyler;

    impl StyleTransfer for BrokenStyler {
        fn restyle(&self, _image: &RgbImage) -> Result<RgbImage, PipelineError> {
            Ok(RgbImage::new(1, 1))
        }
    }

    fn room_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            image::Rgb([(x * 3) as u8, (y * 5) as u8, 90])
        });
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
        buf
    }

    fn sofa_boxes() -> Vec<BoundingBox> {
        vec![
            BoundingBox::new(10, 10, 30, 25, "sofa", 0.92),
            BoundingBox::new(35, 5, 45, 20, "chair", 0.30),
        ]
    }

    // ─────────── Typed API tests ─────────────────────────────────

    #[test]
    fn pending_exposes_source_bytes() {
        let png = room_png(48, 32);
        let expected_len = png.len();
        let pending = Pipeline::new(png, PipelineConfig::default());
        assert_eq!(pending.source().len(), expected_len);
    }

    #[test]
    fn decode_empty_input_returns_error() {
        let result = Pipeline::new(vec![], PipelineConfig::default()).decode();
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn decode_corrupt_input_returns_error() {
        let result = Pipeline::new(vec![0xFF, 0x00], PipelineConfig::default()).decode();
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn decode_rejects_invalid_config() {
        let config = PipelineConfig {
            score_threshold: 1.5,
            ..PipelineConfig::default()
        };
        let result = Pipeline::new(room_png(10, 10), config).decode();
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn detect_filters_by_score() {
        let detected = Pipeline::new(room_png(48, 32), PipelineConfig::default())
            .decode()
            .unwrap()
            .detect(&FixedDetector(sofa_boxes()))
            .unwrap();
        // The 0.30 chair falls under the default 0.5 threshold.
        assert_eq!(detected.detections().len(), 1);
        assert_eq!(detected.detections()[0].label, "sofa");
    }

    #[test]
    fn detect_failure_aborts_run() {
        let result = Pipeline::new(room_png(48, 32), PipelineConfig::default())
            .decode()
            .unwrap()
            .detect(&FailingDetector);
        assert!(matches!(result, Err(PipelineError::ModelInference(_))));
    }

    #[test]
    fn mask_covers_surviving_detections() {
        let masked = Pipeline::new(room_png(48, 32), PipelineConfig::default())
            .decode()
            .unwrap()
            .detect(&FixedDetector(sofa_boxes()))
            .unwrap()
            .build_mask();
        // 20x15 sofa box only; the filtered chair contributes nothing.
        assert_eq!(masked.mask().foreground_count(), 20 * 15);
    }

    #[test]
    fn mask_margin_grows_foreground() {
        let config = PipelineConfig {
            mask_margin: 2,
            ..PipelineConfig::default()
        };
        let masked = Pipeline::new(room_png(48, 32), config)
            .decode()
            .unwrap()
            .detect(&FixedDetector(vec![BoundingBox::new(
                10, 10, 20, 20, "tv", 0.9,
            )]))
            .unwrap()
            .build_mask();
        // 10x10 grown by 2 each side.
        assert_eq!(masked.mask().foreground_count(), 14 * 14);
    }

    #[test]
    fn no_detections_inpaints_to_identity() {
        let styled = Pipeline::new(room_png(48, 32), PipelineConfig::default())
            .decode()
            .unwrap()
            .detect(&FixedDetector(vec![]))
            .unwrap()
            .build_mask()
            .inpaint()
            .unwrap()
            .restyle(None)
            .unwrap();
        let result = styled.into_result();
        assert!(result.mask.is_all_background());
        assert_eq!(result.original.as_raw(), result.inpainted.as_raw());
    }

    #[test]
    fn skipping_style_never_invokes_the_adapter() {
        let styler = TintStyler::new();
        let result = Pipeline::new(room_png(48, 32), PipelineConfig::default())
            .decode()
            .unwrap()
            .detect(&FixedDetector(sofa_boxes()))
            .unwrap()
            .build_mask()
            .inpaint()
            .unwrap()
            .restyle(None)
            .unwrap()
            .into_result();
        assert!(result.styled.is_none());
        assert_eq!(styler.calls.get(), 0);
    }

    #[test]
    fn restyle_applies_the_adapter_once() {
        let styler = TintStyler::new();
        let result = Pipeline::new(room_png(48, 32), PipelineConfig::default())
            .decode()
            .unwrap()
            .detect(&FixedDetector(sofa_boxes()))
            .unwrap()
            .build_mask()
            .inpaint()
            .unwrap()
            .restyle(Some(&styler))
            .unwrap()
            .into_result();
        assert!(result.styled.is_some());
        assert_eq!(styler.calls.get(), 1);
        assert_eq!(
            Dimensions::of(result.styled.as_ref().unwrap()),
            result.dimensions,
        );
    }

    #[test]
    fn restyle_rejects_mismatched_output_dimensions() {
        let result = Pipeline::new(room_png(48, 32), PipelineConfig::default())
            .decode()
            .unwrap()
            .detect(&FixedDetector(sofa_boxes()))
            .unwrap()
            .build_mask()
            .inpaint()
            .unwrap()
            .restyle(Some(&BrokenStyler));
        assert!(matches!(result, Err(PipelineError::ModelInference(_))));
    }

    #[test]
    fn final_image_prefers_styled_over_inpainted() {
        let styler = TintStyler::new();
        let result = Pipeline::new(room_png(48, 32), PipelineConfig::default())
            .decode()
            .unwrap()
            .detect(&FixedDetector(vec![]))
            .unwrap()
            .build_mask()
            .inpaint()
            .unwrap()
            .restyle(Some(&styler))
            .unwrap()
            .into_result();
        assert_eq!(
            result.final_image().as_raw(),
            result.styled.as_ref().unwrap().as_raw(),
        );
    }

    #[test]
    fn styled_dimensions_accessor() {
        let styled = Pipeline::new(room_png(48, 32), PipelineConfig::default())
            .decode()
            .unwrap()
            .detect(&FixedDetector(vec![]))
            .unwrap()
            .build_mask()
            .inpaint()
            .unwrap()
            .restyle(None)
            .unwrap();
        assert_eq!(
            styled.dimensions(),
            Dimensions {
                width: 48,
                height: 32,
            },
        );
    }

    // ─────────── Helper: drive a Stage to completion ────────────

    /// Advance a [`Stage`] to completion, returning the final stage
    /// and a log of `(index, name)` pairs visited along the way.
    #[allow(clippy::type_complexity)]
    fn drive_to_end(
        start: Stage,
        adapters: Adapters<'_>,
    ) -> Result<(Stage, Vec<(usize, &'static str)>), PipelineError> {
        let mut log = vec![(start.index(), start.name())];
        let mut stage = start;
        loop {
            match stage.advance(adapters)? {
                Advance::Next(next) => {
                    log.push((next.index(), next.name()));
                    stage = next;
                }
                Advance::Complete(done) => return Ok((done, log)),
            }
        }
    }

    // ─────────── PipelineStage trait + Stage enum tests ───────────

    #[test]
    fn stage_names_and_indices() {
        let detector = FixedDetector(sofa_boxes());
        let adapters = Adapters::new(&detector);
        let start: Stage = Pipeline::new(room_png(48, 32), PipelineConfig::default()).into();

        let (_, log) = drive_to_end(start, adapters).unwrap();
        let expected = [
            (0, "source"),
            (1, "decode"),
            (2, "detect"),
            (3, "mask"),
            (4, "inpaint"),
            (5, "style"),
        ];
        assert_eq!(log.as_slice(), &expected);
    }

    #[test]
    fn loop_to_completion_matches_chained_api() {
        let png = room_png(48, 32);
        let config = PipelineConfig::default();
        let detector = FixedDetector(sofa_boxes());
        let styler = TintStyler::new();

        let chained = Pipeline::new(png.clone(), config.clone())
            .decode()
            .unwrap()
            .detect(&detector)
            .unwrap()
            .build_mask()
            .inpaint()
            .unwrap()
            .restyle(Some(&styler))
            .unwrap()
            .into_result();

        let adapters = Adapters::new(&detector).with_styler(&styler);
        let start: Stage = Pipeline::new(png, config).into();
        let (final_stage, _) = drive_to_end(start, adapters).unwrap();
        let looped = final_stage.complete(adapters).unwrap();

        assert_eq!(chained.original, looped.original);
        assert_eq!(chained.detections, looped.detections);
        assert_eq!(chained.mask, looped.mask);
        assert_eq!(chained.inpainted, looped.inpainted);
        assert_eq!(chained.styled, looped.styled);
        assert_eq!(chained.dimensions, looped.dimensions);
    }

    #[test]
    fn complete_from_pending() {
        let detector = FixedDetector(sofa_boxes());
        let adapters = Adapters::new(&detector);
        let pending = Pipeline::new(room_png(48, 32), PipelineConfig::default());
        let result = pending.complete(adapters).unwrap();
        assert!(!result.detections.is_empty());
        assert!(result.styled.is_none());
    }

    #[test]
    fn complete_from_mid_stage() {
        let detector = FixedDetector(sofa_boxes());
        let adapters = Adapters::new(&detector);
        let masked = Pipeline::new(room_png(48, 32), PipelineConfig::default())
            .decode()
            .unwrap()
            .detect(&detector)
            .unwrap()
            .build_mask();
        let result = masked.complete(adapters).unwrap();
        assert!(!result.mask.is_all_background());
    }

    #[test]
    fn next_on_styled_returns_none() {
        let detector = FixedDetector(vec![]);
        let adapters = Adapters::new(&detector);
        let styled = Pipeline::new(room_png(48, 32), PipelineConfig::default())
            .decode()
            .unwrap()
            .detect(&detector)
            .unwrap()
            .build_mask()
            .inpaint()
            .unwrap()
            .restyle(None)
            .unwrap();
        assert!(styled.next(adapters).unwrap().is_none());
    }

    #[test]
    fn stage_is_complete() {
        let detector = FixedDetector(vec![]);
        let adapters = Adapters::new(&detector);
        let start: Stage = Pipeline::new(room_png(48, 32), PipelineConfig::default()).into();
        assert!(!start.is_complete());

        let (final_stage, _) = drive_to_end(start, adapters).unwrap();
        assert!(final_stage.is_complete());
    }

    #[test]
    fn output_variant_matches_stage() {
        let detector = FixedDetector(sofa_boxes());
        let adapters = Adapters::new(&detector);
        let start: Stage = Pipeline::new(room_png(48, 32), PipelineConfig::default()).into();

        let mut stage = start;
        let mut visited = 0;
        loop {
            let idx = stage.index();
            let variant_idx = match stage.output() {
                StageOutput::Source { .. } => 0,
                StageOutput::Received { .. } => 1,
                StageOutput::Detected { .. } => 2,
                StageOutput::Masked { .. } => 3,
                StageOutput::Inpainted { .. } => 4,
                StageOutput::Styled { .. } => 5,
            };
            assert_eq!(idx, variant_idx, "output variant mismatch at index {idx}");
            visited += 1;
            match stage.advance(adapters).unwrap() {
                Advance::Next(next) => stage = next,
                Advance::Complete(_) => break,
            }
        }
        assert_eq!(visited, STAGE_COUNT);
    }

    #[test]
    fn detect_error_via_advance() {
        let adapters = Adapters::new(&FailingDetector);
        let stage: Stage = Pipeline::new(room_png(48, 32), PipelineConfig::default()).into();
        let stage = match stage.advance(adapters).unwrap() {
            Advance::Next(next) => next,
            Advance::Complete(_) => panic!("pipeline completed prematurely"),
        };
        let result = stage.advance(adapters);
        assert!(matches!(result, Err(PipelineError::ModelInference(_))));
    }

    #[test]
    fn from_conversions_preserve_index() {
        let png = room_png(48, 32);
        let detector = FixedDetector(vec![]);

        let pending = Pipeline::new(png.clone(), PipelineConfig::default());
        let stage: Stage = pending.into();
        assert_eq!(stage.index(), 0);

        let received = Pipeline::new(png.clone(), PipelineConfig::default())
            .decode()
            .unwrap();
        let stage: Stage = received.into();
        assert_eq!(stage.index(), 1);

        let detected = Pipeline::new(png, PipelineConfig::default())
            .decode()
            .unwrap()
            .detect(&detector)
            .unwrap();
        let stage: Stage = detected.into();
        assert_eq!(stage.index(), 2);
    }

    #[test]
    fn metrics_track_stage_work() {
        let detector = FixedDetector(sofa_boxes());
        let adapters = Adapters::new(&detector);
        let start: Stage = Pipeline::new(room_png(48, 32), PipelineConfig::default()).into();
        assert!(start.metrics().is_none());

        let (final_stage, _) = drive_to_end(start, adapters).unwrap();
        match final_stage.metrics() {
            Some(StageMetrics::Style { applied }) => assert!(!applied),
            other => panic!("expected style metrics, got {other:?}"),
        }
    }
}
