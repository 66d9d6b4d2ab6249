//! Fixed-shape NCHW input tensor

use crate::PrepError;
use ndarray::Array4;
use std::fmt;

/// Number of color channels (RGB)
pub const CHANNELS: usize = 3;
/// Input height in pixels
pub const HEIGHT: usize = 224;
/// Input width in pixels
pub const WIDTH: usize = 224;
/// Full input shape: (batch, channels, height, width)
pub const INPUT_SHAPE: [usize; 4] = [1, CHANNELS, HEIGHT, WIDTH];

/// Preprocessed image as a `(1, 3, 224, 224)` FP32 tensor
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Array4<f32>,
}

impl ImageTensor {
    /// Wrap an existing array, rejecting any shape other than [`INPUT_SHAPE`]
    pub fn new(data: Array4<f32>) -> Result<Self, PrepError> {
        if data.shape() != INPUT_SHAPE {
            return Err(PrepError::ShapeMismatch {
                expected: INPUT_SHAPE.to_vec(),
                actual: data.shape().to_vec(),
            });
        }
        Ok(Self { data })
    }

    /// Rebuild a tensor from row-major values
    pub fn from_flat(values: Vec<f32>) -> Result<Self, PrepError> {
        let len = values.len();
        let dims = (INPUT_SHAPE[0], INPUT_SHAPE[1], INPUT_SHAPE[2], INPUT_SHAPE[3]);
        let data = Array4::from_shape_vec(dims, values).map_err(|_| PrepError::ShapeMismatch {
            expected: INPUT_SHAPE.to_vec(),
            actual: vec![len],
        })?;
        Ok(Self { data })
    }

    /// Tensor shape as sent on the wire
    pub fn shape(&self) -> Vec<usize> {
        self.data.shape().to_vec()
    }

    /// Total element count
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Values in row-major (C) order regardless of the underlying memory layout
    pub fn flatten(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    /// Borrow the underlying array
    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }
}

/// Formats the shape as `(1, 3, 224, 224)`
impl fmt::Display for ImageTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.data.shape().iter().map(|d| d.to_string()).collect();
        write!(f, "({})", dims.join(", "))
    }
}
