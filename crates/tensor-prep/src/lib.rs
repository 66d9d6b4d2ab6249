//! Tensor Preparation
//!
//! Builds the fixed-shape `(1, 3, 224, 224)` FP32 input tensor for image
//! classification models. Pixel data comes from a pluggable [`TensorSource`]:
//! - Synthetic uniform noise (smoke testing without a real image)
//! - Decoded image files, resized and ImageNet-normalized

mod source;
mod tensor;

pub use source::{build_source, DecodedImageSource, SourceKind, SyntheticSource, TensorSource};
pub use tensor::{ImageTensor, CHANNELS, HEIGHT, INPUT_SHAPE, WIDTH};

use thiserror::Error;

/// Errors while preparing an input tensor
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("Image decode failed: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("Invalid tensor shape: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Unknown tensor source: {0} (expected \"synthetic\" or \"decode\")")]
    UnknownSource(String),
}
