//! Model loading errors.
//!
//! Load-time failures get their own error type so callers can
//! distinguish "the model file is missing or corrupt" (a deployment
//! problem, reported before any photo is touched) from inference
//! failures, which surface through
//! [`PipelineError::ModelInference`](restage_pipeline::PipelineError).

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading model weights or style references.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A `.rten` model file could not be loaded.
    #[error("failed to load model {}: {message}", path.display())]
    Load {
        /// Path of the model file.
        path: PathBuf,
        /// Loader error message.
        message: String,
    },

    /// A style reference image could not be read or decoded.
    #[error("failed to read style image {}: {source}", path.display())]
    StyleImage {
        /// Path of the style image.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: image::ImageError,
    },
}
