//! restage-pipeline: Pure furniture removal pipeline (sans-IO).
//!
//! Turns a furnished room photo into an emptied (and optionally
//! restyled) one through:
//! decode -> furniture detection -> mask rasterization -> inpainting ->
//! optional style transfer.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Model loading and all
//! filesystem interaction live in `restage-models` and the CLI.

pub mod decode;
pub mod detect;
pub mod diagnostics;
pub mod inpaint;
pub mod mask;
pub mod pipeline;
pub mod style;
pub mod types;

pub use detect::Detector;
pub use pipeline::{Adapters, Pipeline};
pub use style::StyleTransfer;
pub use types::{
    BoundingBox, Dimensions, Mask, PipelineConfig, PipelineError, ProcessResult, StagedResult,
};

/// Run the full furniture removal pipeline.
///
/// Takes raw photo bytes (PNG, JPEG, BMP, WebP), a configuration, and
/// the model adapters, then produces a [`ProcessResult`] containing the
/// final image and the source photo dimensions. Intermediates are
/// discarded; use [`process_staged`] to keep them.
///
/// # Pipeline steps
///
/// 1. Decode photo to 3-channel RGB
/// 2. Furniture detection (pretrained model) + score filtering
/// 3. Mask rasterization from bounding boxes (+ optional margin growth)
/// 4. Inpainting of the masked regions
/// 5. Optional style transfer (skipped when the bundle has no styler)
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the config is out of range.
/// Returns [`PipelineError::EmptyInput`] if `photo_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
/// Returns [`PipelineError::ModelInference`] if a model adapter fails.
pub fn process(
    photo_bytes: &[u8],
    config: &PipelineConfig,
    adapters: Adapters<'_>,
) -> Result<ProcessResult, PipelineError> {
    let staged = process_staged(photo_bytes, config, adapters)?;
    let dimensions = staged.dimensions;
    let image = match staged.styled {
        Some(styled) => styled,
        None => staged.inpainted,
    };
    Ok(ProcessResult { image, dimensions })
}

/// Run the full pipeline, keeping every intermediate result.
///
/// Same steps and error conditions as [`process`], but the returned
/// [`StagedResult`] retains the original photo, the detections, the
/// mask, the inpainted image, and the styled image (when styling ran)
/// for visualization and export.
///
/// # Errors
///
/// See [`process`].
pub fn process_staged(
    photo_bytes: &[u8],
    config: &PipelineConfig,
    adapters: Adapters<'_>,
) -> Result<StagedResult, PipelineError> {
    let result = Pipeline::new(photo_bytes.to_vec(), config.clone())
        .decode()?
        .detect(adapters.detector())?
        .build_mask()
        .inpaint()?
        .restyle(adapters.styler())?
        .into_result();
    Ok(result)
}
