//! Style transfer backed by a pretrained two-input `.rten` model.
//!
//! The model takes a content tensor and a style tensor (both NCHW f32)
//! and returns the content re-rendered in the style image's palette and
//! texture. The style reference is fixed at load time, so a
//! [`RoomStyler`] represents one concrete style; hosting code builds
//! one per requested style.

use std::path::Path;

use image::RgbImage;
use image::imageops::FilterType;
use rten::Model;
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;

use restage_pipeline::{PipelineError, StyleTransfer};

use crate::error::ModelError;

/// Square resolution the content image is rendered at.
const CONTENT_SIZE: u32 = 512;

/// Square resolution the style reference is encoded at.
const STYLE_SIZE: u32 = 256;

/// Pretrained style transfer model bound to one style reference image.
pub struct RoomStyler {
    model: Model,
    style: NdTensor<f32, 4>,
}

impl RoomStyler {
    /// Load styler weights and a style reference image.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Load`] when the model file is missing or
    /// invalid, and [`ModelError::StyleImage`] when the style reference
    /// cannot be read.
    pub fn load(model_path: &Path, style_image_path: &Path) -> Result<Self, ModelError> {
        let model = Model::load_file(model_path).map_err(|e| ModelError::Load {
            path: model_path.to_path_buf(),
            message: e.to_string(),
        })?;
        let style_image = image::open(style_image_path)
            .map_err(|source| ModelError::StyleImage {
                path: style_image_path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        Ok(Self::from_parts(model, &style_image))
    }

    /// Build a styler from an already-loaded model and style image.
    #[must_use]
    pub fn from_parts(model: Model, style_image: &RgbImage) -> Self {
        Self {
            model,
            style: image_to_tensor(style_image, STYLE_SIZE),
        }
    }
}

impl StyleTransfer for RoomStyler {
    fn restyle(&self, image: &RgbImage) -> Result<RgbImage, PipelineError> {
        let content = image_to_tensor(image, CONTENT_SIZE);

        // The model declares content and style inputs in that order;
        // bind them positionally.
        let input_ids = self.model.input_ids().to_vec();
        if input_ids.len() != 2 {
            return Err(PipelineError::ModelInference(format!(
                "style model declares {} inputs, expected content + style",
                input_ids.len(),
            )));
        }
        let output_ids = self.model.output_ids().to_vec();

        let mut outputs = self
            .model
            .run(
                vec![
                    (input_ids[0], content.into()),
                    (input_ids[1], self.style.clone().into()),
                ],
                &output_ids,
                None,
            )
            .map_err(|e| PipelineError::ModelInference(e.to_string()))?;
        if outputs.is_empty() {
            return Err(PipelineError::ModelInference(
                "style model produced no outputs".to_string(),
            ));
        }
        let rendered: NdTensor<f32, 4> = outputs.remove(0).try_into().map_err(|_| {
            PipelineError::ModelInference("style output is not a rank-4 f32 tensor".to_string())
        })?;

        let styled = tensor_to_image(&rendered)?;
        // Render back at the photo's native resolution.
        Ok(image::imageops::resize(
            &styled,
            image.width(),
            image.height(),
            FilterType::Triangle,
        ))
    }
}

/// Convert an RGB image into a normalized `[1, 3, size, size]` NCHW
/// tensor.
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

/// Convert a `[1, 3, h, w]` tensor back to an RGB image, clamping to
/// the unit range.
fn tensor_to_image(tensor: &NdTensor<f32, 4>) -> Result<RgbImage, PipelineError> {
    let [batch, channels, height, width] = tensor.shape();
    if batch != 1 || channels != 3 || height == 0 || width == 0 {
        return Err(PipelineError::ModelInference(format!(
            "style output has shape [{batch}, {channels}, {height}, {width}], expected [1, 3, h, w]",
        )));
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let image = RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let mut rgb = [0_u8; 3];
        for (c, out) in rgb.iter_mut().enumerate() {
            *out = (tensor[[0, c, y, x]].clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        image::Rgb(rgb)
    });
    Ok(image)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn image_to_tensor_normalizes_channels() {
        let img = RgbImage::from_pixel(4, 4, image::Rgb([0, 255, 51]));
        let tensor = image_to_tensor(&img, 4);
        assert_eq!(tensor.shape(), [1, 3, 4, 4]);
        assert!(tensor[[0, 0, 2, 2]].abs() < 1e-3);
        assert!((tensor[[0, 1, 2, 2]] - 1.0).abs() < 1e-3);
        assert!((tensor[[0, 2, 2, 2]] - 0.2).abs() < 1e-2);
    }

    #[test]
    fn tensor_to_image_round_trips_values() {
        let img = RgbImage::from_pixel(6, 6, image::Rgb([100, 150, 200]));
        let tensor = image_to_tensor(&img, 6);
        let back = tensor_to_image(&tensor).unwrap();
        assert_eq!(back.dimensions(), (6, 6));
        let p = back.get_pixel(3, 3);
        assert!(i16::from(p.0[0]).abs_diff(100) <= 1);
        assert!(i16::from(p.0[1]).abs_diff(150) <= 1);
        assert!(i16::from(p.0[2]).abs_diff(200) <= 1);
    }

    #[test]
    fn tensor_to_image_clamps_out_of_range() {
        let tensor = NdTensor::from_data([1, 3, 1, 1], vec![-0.5, 0.5, 1.5]);
        let img = tensor_to_image(&tensor).unwrap();
        assert_eq!(img.get_pixel(0, 0), &image::Rgb([0, 128, 255]));
    }

    #[test]
    fn tensor_to_image_rejects_bad_shape() {
        let tensor = NdTensor::from_data([1, 1, 2, 2], vec![0.0; 4]);
        let result = tensor_to_image(&tensor);
        assert!(matches!(result, Err(PipelineError::ModelInference(_))));
    }
}
