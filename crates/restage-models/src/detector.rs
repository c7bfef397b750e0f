//! Furniture detection backed by a pretrained `.rten` model.
//!
//! The model is a single-stage detector with the usual
//! `[1, 4 + classes, anchors]` output layout: each anchor column holds
//! a center-format box (`cx, cy, w, h` in input pixels) followed by
//! per-class scores. Decoding filters by confidence, applies per-class
//! greedy non-maximum suppression, and maps the surviving boxes back to
//! source photo coordinates.
//!
//! Weights are loaded once via [`FurnitureDetector::load`]; inference
//! itself is stateless and deterministic.

use std::path::Path;

use image::RgbImage;
use image::imageops::FilterType;
use rten::Model;
use rten_tensor::prelude::*;
use rten_tensor::{NdTensor, NdTensorView};

use restage_pipeline::{BoundingBox, Detector, PipelineError};

use crate::error::ModelError;

/// Class labels the bundled furniture model was trained on, in output
/// index order.
pub const LABELS: [&str; 8] = [
    "chair",
    "sofa",
    "coffee table",
    "bed",
    "table",
    "lamp",
    "painting",
    "tv",
];

/// Square inference resolution the model expects.
const INPUT_SIZE: u32 = 640;

/// Anchors scoring below this are discarded before NMS. The pipeline
/// applies its own (configurable) threshold on top of this floor.
const CONFIDENCE_FLOOR: f32 = 0.25;

/// Overlap above which the lower-scoring box of a same-class pair is
/// suppressed.
const IOU_THRESHOLD: f32 = 0.45;

/// A decoded detection in model input coordinates, before NMS and
/// coordinate un-mapping.
#[derive(Debug, Clone, PartialEq)]
struct RawDetection {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    class: usize,
    score: f32,
}

/// Pretrained furniture detector.
pub struct FurnitureDetector {
    model: Model,
}

impl FurnitureDetector {
    /// Load detector weights from a `.rten` file.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Load`] when the file is missing or not a
    /// valid model.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let model = Model::load_file(path).map_err(|e| ModelError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self { model })
    }
}

impl Detector for FurnitureDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<BoundingBox>, PipelineError> {
        let input = image_to_tensor(image, INPUT_SIZE);
        let output = self
            .model
            .run_one(input.into(), None)
            .map_err(|e| PipelineError::ModelInference(e.to_string()))?;
        let preds: NdTensor<f32, 3> = output.try_into().map_err(|_| {
            PipelineError::ModelInference("detector output is not a rank-3 f32 tensor".to_string())
        })?;

        let raw = decode_predictions(&preds.view(), CONFIDENCE_FLOOR)?;
        let kept = non_max_suppression(raw, IOU_THRESHOLD);

        // Un-map from the square inference resolution to photo pixels.
        let scale_x = f64::from(image.width()) / f64::from(INPUT_SIZE);
        let scale_y = f64::from(image.height()) / f64::from(INPUT_SIZE);
        Ok(kept
            .into_iter()
            .map(|d| to_bounding_box(&d, scale_x, scale_y))
            .collect())
    }
}

/// Convert an RGB image into a normalized `[1, 3, size, size]` NCHW
/// tensor, stretching to the square inference resolution.
fn image_to_tensor(image: &RgbImage, size: u32) -> NdTensor<f32, 4> {
    let resized = image::imageops::resize(image, size, size, FilterType::Triangle);
    let side = size as usize;
    let mut data = vec![0.0_f32; 3 * side * side];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for (c, value) in pixel.0.into_iter().enumerate() {
            data[c * side * side + y * side + x] = f32::from(value) / 255.0;
        }
    }
    NdTensor::from_data([1, 3, side, side], data)
}

/// Decode a `[1, 4 + classes, anchors]` prediction tensor into raw
/// detections, keeping anchors whose best class score reaches
/// `confidence`.
fn decode_predictions(
    preds: &NdTensorView<'_, f32, 3>,
    confidence: f32,
) -> Result<Vec<RawDetection>, PipelineError> {
    let attrs = preds.size(1);
    let anchors = preds.size(2);
    let Some(class_count) = attrs.checked_sub(4).filter(|&n| n > 0) else {
        return Err(PipelineError::ModelInference(format!(
            "detector output has {attrs} attributes per anchor, expected at least 5",
        )));
    };

    let mut detections = Vec::new();
    for i in 0..anchors {
        let mut best_class = 0;
        let mut best_score = 0.0_f32;
        for c in 0..class_count {
            let score = preds[[0, 4 + c, i]];
            if score > best_score {
                best_class = c;
                best_score = score;
            }
        }
        if best_score < confidence {
            continue;
        }

        let cx = preds[[0, 0, i]];
        let cy = preds[[0, 1, i]];
        let w = preds[[0, 2, i]];
        let h = preds[[0, 3, i]];
        detections.push(RawDetection {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
            class: best_class,
            score: best_score,
        });
    }
    Ok(detections)
}

/// Intersection-over-union of two boxes.
fn iou(a: &RawDetection, b: &RawDetection) -> f32 {
    let ix = (a.x2.min(b.x2) - a.x1.max(b.x1)).max(0.0);
    let iy = (a.y2.min(b.y2) - a.y1.max(b.y1)).max(0.0);
    let intersection = ix * iy;
    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    let union = area_a + area_b - intersection;
    if union <= 0.0 {
        return 0.0;
    }
    intersection / union
}

/// Greedy per-class non-maximum suppression.
///
/// Detections are visited in descending score order; each survivor
/// suppresses later same-class boxes overlapping it beyond
/// `iou_threshold`. Ties break on original order, keeping the result
/// deterministic.
fn non_max_suppression(mut detections: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    detections.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<RawDetection> = Vec::new();
    for candidate in detections {
        let suppressed = kept
            .iter()
            .any(|k| k.class == candidate.class && iou(k, &candidate) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

/// Map a raw detection back to source photo coordinates.
#[allow(clippy::cast_possible_truncation)]
fn to_bounding_box(d: &RawDetection, scale_x: f64, scale_y: f64) -> BoundingBox {
    let label = LABELS.get(d.class).copied().unwrap_or("object");
    BoundingBox::new(
        (f64::from(d.x1) * scale_x).round() as i32,
        (f64::from(d.y1) * scale_y).round() as i32,
        (f64::from(d.x2) * scale_x).round() as i32,
        (f64::from(d.y2) * scale_y).round() as i32,
        label,
        d.score,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw(x1: f32, y1: f32, x2: f32, y2: f32, class: usize, score: f32) -> RawDetection {
        RawDetection {
            x1,
            y1,
            x2,
            y2,
            class,
            score,
        }
    }

    /// Build a `[1, 4 + classes, anchors]` tensor from center-format
    /// anchor columns.
    fn prediction_tensor(columns: &[(f32, f32, f32, f32, Vec<f32>)]) -> NdTensor<f32, 3> {
        let class_count = columns[0].4.len();
        let attrs = 4 + class_count;
        let anchors = columns.len();
        let mut data = vec![0.0_f32; attrs * anchors];
        for (i, (cx, cy, w, h, scores)) in columns.iter().enumerate() {
            data[i] = *cx;
            data[anchors + i] = *cy;
            data[2 * anchors + i] = *w;
            data[3 * anchors + i] = *h;
            for (c, s) in scores.iter().enumerate() {
                data[(4 + c) * anchors + i] = *s;
            }
        }
        NdTensor::from_data([1, attrs, anchors], data)
    }

    #[test]
    fn image_to_tensor_has_nchw_shape_and_unit_range() {
        let img = RgbImage::from_pixel(10, 6, image::Rgb([255, 128, 0]));
        let tensor = image_to_tensor(&img, 8);
        assert_eq!(tensor.shape(), [1, 3, 8, 8]);
        assert!((tensor[[0, 0, 4, 4]] - 1.0).abs() < 1e-3);
        assert!((tensor[[0, 1, 4, 4]] - 128.0 / 255.0).abs() < 1e-2);
        assert!(tensor[[0, 2, 4, 4]].abs() < 1e-3);
    }

    #[test]
    fn decode_keeps_confident_anchors_only() {
        let tensor = prediction_tensor(&[
            (100.0, 100.0, 40.0, 20.0, vec![0.9, 0.1]),
            (200.0, 200.0, 30.0, 30.0, vec![0.1, 0.05]),
        ]);
        let decoded = decode_predictions(&tensor.view(), 0.25).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].class, 0);
        assert!((decoded[0].x1 - 80.0).abs() < 1e-4);
        assert!((decoded[0].y2 - 110.0).abs() < 1e-4);
    }

    #[test]
    fn decode_picks_best_class() {
        let tensor = prediction_tensor(&[(50.0, 50.0, 10.0, 10.0, vec![0.3, 0.8, 0.4])]);
        let decoded = decode_predictions(&tensor.view(), 0.25).unwrap();
        assert_eq!(decoded[0].class, 1);
        assert!((decoded[0].score - 0.8).abs() < 1e-6);
    }

    #[test]
    fn decode_rejects_malformed_layout() {
        let tensor = NdTensor::from_data([1, 3, 2], vec![0.0; 6]);
        let result = decode_predictions(&tensor.view(), 0.25);
        assert!(matches!(result, Err(PipelineError::ModelInference(_))));
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = raw(0.0, 0.0, 10.0, 10.0, 0, 0.9);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = raw(0.0, 0.0, 10.0, 10.0, 0, 0.9);
        let b = raw(20.0, 20.0, 30.0, 30.0, 0, 0.9);
        assert!(iou(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn nms_suppresses_overlapping_same_class() {
        let detections = vec![
            raw(0.0, 0.0, 10.0, 10.0, 0, 0.8),
            raw(1.0, 1.0, 11.0, 11.0, 0, 0.9),
            raw(30.0, 30.0, 40.0, 40.0, 0, 0.7),
        ];
        let kept = non_max_suppression(detections, 0.45);
        assert_eq!(kept.len(), 2);
        // Highest score survives.
        assert!((kept[0].score - 0.9).abs() < 1e-6);
        assert!((kept[1].score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn nms_keeps_overlapping_different_classes() {
        let detections = vec![
            raw(0.0, 0.0, 10.0, 10.0, 0, 0.9),
            raw(1.0, 1.0, 11.0, 11.0, 1, 0.8),
        ];
        let kept = non_max_suppression(detections, 0.45);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn to_bounding_box_scales_and_labels() {
        let d = raw(64.0, 32.0, 128.0, 96.0, 1, 0.75);
        // Inference at 640 square, photo was 1280x320.
        let bbox = to_bounding_box(&d, 2.0, 0.5);
        assert_eq!(bbox.x1, 128);
        assert_eq!(bbox.y1, 16);
        assert_eq!(bbox.x2, 256);
        assert_eq!(bbox.y2, 48);
        assert_eq!(bbox.label, "sofa");
        assert!((bbox.score - 0.75).abs() < 1e-6);
    }

    #[test]
    fn to_bounding_box_unknown_class_falls_back() {
        let d = raw(0.0, 0.0, 1.0, 1.0, 99, 0.5);
        let bbox = to_bounding_box(&d, 1.0, 1.0);
        assert_eq!(bbox.label, "object");
    }
}
