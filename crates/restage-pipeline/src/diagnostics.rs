//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation intended for
//! threshold tuning and model comparison. Use
//! [`process_staged_with_diagnostics`] to collect them alongside the
//! pipeline results.
//!
//! Timing is abstracted behind the [`Clock`] trait so this crate stays
//! free of platform assumptions; hosting binaries provide an
//! implementation backed by [`std::time::Instant`].
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::{Adapters, Pipeline, PipelineStage};
use crate::types::{PipelineConfig, PipelineError, StagedResult};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Monotonic time source for stage timing.
///
/// Abstracting the clock keeps the pipeline crate free of platform
/// assumptions and lets tests supply a deterministic clock.
pub trait Clock {
    /// An opaque instant captured by [`now`](Self::now).
    type Instant;

    /// Capture the current instant.
    fn now(&self) -> Self::Instant;

    /// Duration elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
///
/// Each field captures metrics for one logical stage of the pipeline.
/// The style stage is `None` when no styler was supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: photo decoding.
    pub decode: StageDiagnostics,
    /// Stage 2: furniture detection + score filtering.
    pub detection: StageDiagnostics,
    /// Stage 3: mask rasterization + margin growth.
    pub mask: StageDiagnostics,
    /// Stage 4: inpainting.
    pub inpaint: StageDiagnostics,
    /// Stage 5: style transfer (only when a styler was supplied).
    pub style: Option<StageDiagnostics>,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
///
/// Each variant captures the counts and sizes meaningful for that
/// particular processing step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Photo decoding metrics.
    Decode {
        /// Size of the input photo bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Furniture detection metrics.
    Detection {
        /// Detections returned by the model, before filtering.
        raw_count: usize,
        /// Detections surviving the score filter.
        kept_count: usize,
        /// Minimum confidence a detection needed to survive.
        score_threshold: f32,
    },
    /// Mask rasterization metrics.
    Mask {
        /// Number of boxes rasterized.
        box_count: usize,
        /// Foreground pixel count after margin growth.
        foreground_pixels: u64,
        /// Total pixel count for computing coverage.
        total_pixels: u64,
        /// Margin the mask was grown by, in pixels.
        margin: u32,
    },
    /// Inpainting metrics.
    Inpaint {
        /// Number of pixels reconstructed.
        filled_pixels: u64,
        /// Neighborhood radius used for reconstruction.
        radius: u32,
    },
    /// Style transfer metrics.
    Style {
        /// Whether a styler ran (`false` when the step was skipped).
        applied: bool,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source photo width in pixels.
    pub image_width: u32,
    /// Source photo height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Detections that survived the score filter.
    pub detection_count: usize,
    /// Foreground pixels reconstructed by inpainting.
    pub masked_pixels: u64,
    /// Whether style transfer ran.
    pub styled: bool,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Photo: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        // Per-stage breakdown.
        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let stages: Vec<(&str, &StageDiagnostics)> = {
            let mut s = vec![
                ("Decode", &self.decode),
                ("Detection", &self.detection),
                ("Mask", &self.mask),
                ("Inpaint", &self.inpaint),
            ];
            if let Some(ref style) = self.style {
                s.push(("Style", style));
            }
            s
        };

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Detections: {}  |  Pixels reconstructed: {}  |  Styled: {}",
            self.summary.detection_count,
            self.summary.masked_pixels,
            if self.summary.styled { "yes" } else { "no" },
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => {
            format!("{input_bytes} bytes -> {width}x{height}")
        }
        StageMetrics::Detection {
            raw_count,
            kept_count,
            score_threshold,
        } => {
            format!("{raw_count}->{kept_count} boxes (threshold={score_threshold:.2})")
        }
        StageMetrics::Mask {
            box_count,
            foreground_pixels,
            total_pixels,
            margin,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let coverage = if *total_pixels > 0 {
                *foreground_pixels as f64 / *total_pixels as f64 * 100.0
            } else {
                0.0
            };
            format!("{box_count} boxes, {foreground_pixels} px ({coverage:.1}%) margin={margin}")
        }
        StageMetrics::Inpaint {
            filled_pixels,
            radius,
        } => {
            format!("{filled_pixels} px filled, radius={radius}")
        }
        StageMetrics::Style { applied } => {
            if *applied {
                "applied".to_string()
            } else {
                "skipped".to_string()
            }
        }
    }
}

/// Helper: extract a stage's metrics, which every post-`Pending` stage
/// provides.
fn stage_metrics<S: PipelineStage>(stage: &S) -> Result<StageMetrics, PipelineError> {
    stage.metrics().ok_or_else(|| {
        PipelineError::InvalidImage(format!("stage {} produced no metrics", S::NAME))
    })
}

/// Run the full pipeline, collecting per-stage timing and metrics.
///
/// Behaves exactly like [`crate::process_staged`] but additionally
/// returns a [`PipelineDiagnostics`] describing each stage.
///
/// # Errors
///
/// Returns [`PipelineError`] under the same conditions as
/// [`crate::process_staged`].
pub fn process_staged_with_diagnostics<C: Clock>(
    photo_bytes: &[u8],
    config: &PipelineConfig,
    adapters: Adapters<'_>,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let start = clock.now();

    let t = clock.now();
    let received = Pipeline::new(photo_bytes.to_vec(), config.clone()).decode()?;
    let decode = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: stage_metrics(&received)?,
    };

    let t = clock.now();
    let detected = received.detect(adapters.detector())?;
    let detection = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: stage_metrics(&detected)?,
    };

    let t = clock.now();
    let masked = detected.build_mask();
    let mask = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: stage_metrics(&masked)?,
    };

    let t = clock.now();
    let inpainted = masked.inpaint()?;
    let inpaint = StageDiagnostics {
        duration: clock.elapsed(&t),
        metrics: stage_metrics(&inpainted)?,
    };

    let t = clock.now();
    let styled = inpainted.restyle(adapters.styler())?;
    let style_duration = clock.elapsed(&t);
    let style_metrics = stage_metrics(&styled)?;
    let style = match style_metrics {
        StageMetrics::Style { applied: true } => Some(StageDiagnostics {
            duration: style_duration,
            metrics: style_metrics,
        }),
        _ => None,
    };

    let result = styled.into_result();
    let total_duration = clock.elapsed(&start);

    let masked_pixels = match mask.metrics {
        StageMetrics::Mask {
            foreground_pixels, ..
        } => foreground_pixels,
        _ => 0,
    };
    let summary = PipelineSummary {
        image_width: result.dimensions.width,
        image_height: result.dimensions.height,
        pixel_count: result.dimensions.pixel_count(),
        detection_count: result.detections.len(),
        masked_pixels,
        styled: result.styled.is_some(),
    };

    let diagnostics = PipelineDiagnostics {
        decode,
        detection,
        mask,
        inpaint,
        style,
        total_duration,
        summary,
    };

    Ok((result, diagnostics))
}
