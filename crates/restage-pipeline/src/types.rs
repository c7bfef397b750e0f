//! Shared types for the restage furniture removal pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `RgbImage` so downstream crates can reference pipeline
/// images without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `GrayImage` for consumers that want raw access to mask
/// pixel data.
pub use image::GrayImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing image buffer.
    #[must_use]
    pub fn of(image: &RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An axis-aligned detection rectangle in source image coordinates.
///
/// Produced by a [`Detector`](crate::detect::Detector) and consumed by
/// the mask builder. Coordinates are signed because detectors may emit
/// boxes that extend past the frame; the mask builder clamps them.
///
/// # Invariants
///
/// `x1 < x2`, `y1 < y2`, and `0.0 <= score <= 1.0`. Degenerate or
/// inverted boxes are tolerated downstream (they rasterize to nothing)
/// but detectors are expected not to produce them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge (inclusive).
    pub x1: i32,
    /// Top edge (inclusive).
    pub y1: i32,
    /// Right edge (exclusive).
    pub x2: i32,
    /// Bottom edge (exclusive).
    pub y2: i32,
    /// Class label assigned by the detector (e.g. `"sofa"`).
    pub label: String,
    /// Detector confidence in `[0, 1]`.
    pub score: f32,
}

impl BoundingBox {
    /// Create a bounding box.
    #[must_use]
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32, label: impl Into<String>, score: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            label: label.into(),
            score,
        }
    }

    /// Box width in pixels. Zero for degenerate boxes.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn width(&self) -> u32 {
        (self.x2 - self.x1).max(0) as u32
    }

    /// Box height in pixels. Zero for degenerate boxes.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn height(&self) -> u32 {
        (self.y2 - self.y1).max(0) as u32
    }

    /// Clamp this box to a frame, returning the in-frame pixel ranges
    /// `(x1..x2, y1..y2)` in unsigned coordinates.
    ///
    /// Returns `None` when nothing of the box remains inside the frame
    /// (a degenerate clamp). Boxes partly outside are clamped, never
    /// dropped and never an error.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn clamp_to(
        &self,
        dimensions: Dimensions,
    ) -> Option<(std::ops::Range<u32>, std::ops::Range<u32>)> {
        let w = i64::from(dimensions.width);
        let h = i64::from(dimensions.height);
        let x1 = i64::from(self.x1).clamp(0, w);
        let y1 = i64::from(self.y1).clamp(0, h);
        let x2 = i64::from(self.x2).clamp(0, w);
        let y2 = i64::from(self.y2).clamp(0, h);
        if x1 >= x2 || y1 >= y2 {
            return None;
        }
        Some((x1 as u32..x2 as u32, y1 as u32..y2 as u32))
    }
}

/// Binary occupancy mask, one byte per pixel.
///
/// Pixels are either [`Mask::FOREGROUND`] (inside at least one clamped
/// detection box) or [`Mask::BACKGROUND`]. Always the same size as the
/// source image it was built for; the inpainting stage rejects any
/// mismatch. Created fresh per pipeline run and discarded after
/// inpainting (it survives in [`StagedResult`] purely for display).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    /// Byte value for masked (to-be-inpainted) pixels.
    pub const FOREGROUND: u8 = 255;
    /// Byte value for untouched pixels.
    pub const BACKGROUND: u8 = 0;

    /// An all-background mask of the given size.
    #[must_use]
    pub fn all_background(dimensions: Dimensions) -> Self {
        Self {
            image: GrayImage::from_pixel(
                dimensions.width,
                dimensions.height,
                image::Luma([Self::BACKGROUND]),
            ),
        }
    }

    /// Wrap a grayscale buffer as a mask, snapping every non-zero pixel
    /// to [`Mask::FOREGROUND`] so the binary invariant holds.
    #[must_use]
    pub fn from_image(mut image: GrayImage) -> Self {
        for pixel in image.pixels_mut() {
            pixel.0[0] = if pixel.0[0] == Self::BACKGROUND {
                Self::BACKGROUND
            } else {
                Self::FOREGROUND
            };
        }
        Self { image }
    }

    /// Mask dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.image.width(),
            height: self.image.height(),
        }
    }

    /// Whether the pixel at `(x, y)` is foreground.
    ///
    /// Out-of-range coordinates are background.
    #[must_use]
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        x < self.image.width()
            && y < self.image.height()
            && self.image.get_pixel(x, y).0[0] == Self::FOREGROUND
    }

    /// Number of foreground pixels.
    #[must_use]
    pub fn foreground_count(&self) -> u64 {
        self.image
            .pixels()
            .map(|p| u64::from(u8::from(p.0[0] == Self::FOREGROUND)))
            .sum()
    }

    /// `true` when no pixel is foreground.
    #[must_use]
    pub fn is_all_background(&self) -> bool {
        self.foreground_count() == 0
    }

    /// Borrow the underlying grayscale buffer.
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.image
    }

    /// Consume the mask, returning the underlying grayscale buffer.
    #[must_use]
    pub fn into_image(self) -> GrayImage {
        self.image
    }

    pub(crate) fn set_foreground(&mut self, x: u32, y: u32) {
        self.image.put_pixel(x, y, image::Luma([Self::FOREGROUND]));
    }
}

/// Configuration for the furniture removal pipeline.
///
/// All parameters have defaults matching the `DEFAULT_*` consts, which
/// CLI flag defaults are tied to so the two cannot silently diverge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum detector confidence. Detections scoring below this are
    /// discarded before mask building.
    pub score_threshold: f32,

    /// Number of pixels to grow the mask beyond the raw box union.
    /// Detector boxes tend to sit tight against object edges; a small
    /// margin lets inpainting catch shadows and fringes. `0` keeps the
    /// exact box union.
    pub mask_margin: u32,

    /// Inpainting neighborhood radius in pixels. Must be at least 1.
    pub inpaint_radius: u32,
}

impl PipelineConfig {
    /// Default minimum detector confidence.
    pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;
    /// Default mask growth margin in pixels.
    pub const DEFAULT_MASK_MARGIN: u32 = 0;
    /// Default inpainting neighborhood radius in pixels.
    pub const DEFAULT_INPAINT_RADIUS: u32 = 3;

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when `inpaint_radius`
    /// is zero or `score_threshold` falls outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.inpaint_radius == 0 {
            return Err(PipelineError::InvalidConfig(
                "inpaint_radius must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "score_threshold must be in [0, 1], got {}",
                self.score_threshold,
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            score_threshold: Self::DEFAULT_SCORE_THRESHOLD,
            mask_margin: Self::DEFAULT_MASK_MARGIN,
            inpaint_radius: Self::DEFAULT_INPAINT_RADIUS,
        }
    }
}

/// Result of running the full pipeline without intermediates.
///
/// Contains only the final image (styled when a style reference was
/// supplied, otherwise the inpainted room) and the source dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// The final output image.
    pub image: RgbImage,
    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,
}

/// Result of running the pipeline with all intermediate stage outputs
/// preserved.
///
/// Each field captures the output of one pipeline stage, enabling a
/// frontend to display every step of the processing chain (uploaded
/// photo, detections, mask, furniture-removed, restyled).
///
/// Uses custom `Serialize`/`Deserialize` implementations because the
/// raster buffers from the `image` crate do not implement serde traits;
/// they are serialized as `(width, height, raw_pixels)` tuples.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Stage 0: decoded source photo.
    pub original: RgbImage,
    /// Stage 1: detections that survived the confidence filter.
    pub detections: Vec<BoundingBox>,
    /// Stage 2: rasterized occupancy mask (post-margin when configured).
    pub mask: Mask,
    /// Stage 3: furniture-removed image.
    pub inpainted: RgbImage,
    /// Stage 4: restyled image (`Some` only when a style reference was
    /// supplied).
    pub styled: Option<RgbImage>,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

impl StagedResult {
    /// The final output image — styled if style transfer ran, otherwise
    /// the inpainted room.
    #[must_use]
    pub fn final_image(&self) -> &RgbImage {
        self.styled.as_ref().unwrap_or(&self.inpainted)
    }
}

/// Serde-compatible proxy for [`StagedResult`].
///
/// Raster images are represented as `(width, height, raw_pixel_bytes)`
/// tuples since `image::ImageBuffer` does not implement serde traits.
#[derive(Serialize, Deserialize)]
struct StagedResultProxy {
    original: (u32, u32, Vec<u8>),
    detections: Vec<BoundingBox>,
    mask: (u32, u32, Vec<u8>),
    inpainted: (u32, u32, Vec<u8>),
    styled: Option<(u32, u32, Vec<u8>)>,
    dimensions: Dimensions,
}

fn rgb_proxy(image: &RgbImage) -> (u32, u32, Vec<u8>) {
    (image.width(), image.height(), image.as_raw().clone())
}

fn rgb_from_proxy<E: serde::de::Error>(proxy: (u32, u32, Vec<u8>)) -> Result<RgbImage, E> {
    RgbImage::from_raw(proxy.0, proxy.1, proxy.2)
        .ok_or_else(|| E::custom("invalid RGB image dimensions"))
}

impl Serialize for StagedResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mask = self.mask.as_image();
        let proxy = StagedResultProxy {
            original: rgb_proxy(&self.original),
            detections: self.detections.clone(),
            mask: (mask.width(), mask.height(), mask.as_raw().clone()),
            inpainted: rgb_proxy(&self.inpainted),
            styled: self.styled.as_ref().map(rgb_proxy),
            dimensions: self.dimensions,
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StagedResult {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = StagedResultProxy::deserialize(deserializer)?;

        let mask_image = GrayImage::from_raw(proxy.mask.0, proxy.mask.1, proxy.mask.2)
            .ok_or_else(|| serde::de::Error::custom("invalid mask dimensions"))?;

        Ok(Self {
            original: rgb_from_proxy(proxy.original)?,
            detections: proxy.detections,
            mask: Mask::from_image(mask_image),
            inpainted: rgb_from_proxy(proxy.inpainted)?,
            styled: proxy.styled.map(rgb_from_proxy).transpose()?,
            dimensions: proxy.dimensions,
        })
    }
}

/// Errors that can occur during pipeline processing.
///
/// There is no retry or local recovery anywhere in the pipeline: any
/// error aborts the current run and no partial stage output is
/// surfaced.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input photo.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input photo bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The input decoded to an unusable image (e.g. zero area).
    #[error("invalid input image: {0}")]
    InvalidImage(String),

    /// Mask and image sizes disagree. The inpainting stage never
    /// truncates or stretches to compensate.
    #[error("mask dimensions {mask} do not match image dimensions {image}")]
    DimensionMismatch {
        /// Dimensions of the image being inpainted.
        image: Dimensions,
        /// Dimensions of the offending mask.
        mask: Dimensions,
    },

    /// A pretrained-model adapter call failed or returned malformed
    /// output.
    #[error("model inference failed: {0}")]
    ModelInference(String),

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

/// Serde-compatible proxy for [`PipelineError`].
///
/// `image::ImageError` does not implement serde, so the `ImageDecode`
/// variant stores its `Display` string. A deserialized `ImageDecode`
/// is reconstructed as `InvalidImage` carrying the original message.
#[derive(Serialize, Deserialize)]
enum PipelineErrorProxy {
    ImageDecode(String),
    EmptyInput,
    InvalidImage(String),
    DimensionMismatch { image: Dimensions, mask: Dimensions },
    ModelInference(String),
    InvalidConfig(String),
}

impl Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => PipelineErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => PipelineErrorProxy::EmptyInput,
            Self::InvalidImage(s) => PipelineErrorProxy::InvalidImage(s.clone()),
            Self::DimensionMismatch { image, mask } => PipelineErrorProxy::DimensionMismatch {
                image: *image,
                mask: *mask,
            },
            Self::ModelInference(s) => PipelineErrorProxy::ModelInference(s.clone()),
            Self::InvalidConfig(s) => PipelineErrorProxy::InvalidConfig(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PipelineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            PipelineErrorProxy::ImageDecode(msg) => {
                // The typed image::ImageError cannot be reconstructed;
                // preserve the message.
                Self::InvalidImage(format!("image decode error: {msg}"))
            }
            PipelineErrorProxy::EmptyInput => Self::EmptyInput,
            PipelineErrorProxy::InvalidImage(s) => Self::InvalidImage(s),
            PipelineErrorProxy::DimensionMismatch { image, mask } => {
                Self::DimensionMismatch { image, mask }
            }
            PipelineErrorProxy::ModelInference(s) => Self::ModelInference(s),
            PipelineErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
        })
    }
}
