//! KServe v2 inference wire types

use crate::ranking::{top_k, Prediction};
use crate::ClientError;
use serde::{Deserialize, Serialize};
use tensor_prep::ImageTensor;

/// Datatype tag for 32-bit float tensors
pub const FP32: &str = "FP32";

/// Named input tensor in an inference request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferInput {
    pub name: String,
    pub shape: Vec<usize>,
    pub datatype: String,
    /// Row-major flattened values
    pub data: Vec<f32>,
}

/// Output the server should return
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedOutput {
    pub name: String,
}

/// Body of `POST /v2/models/{model}/infer`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub inputs: Vec<InferInput>,
    pub outputs: Vec<RequestedOutput>,
}

impl InferenceRequest {
    /// Single FP32 input built from `tensor`, requesting a single output
    pub fn new(input_name: &str, tensor: &ImageTensor, output_name: &str) -> Self {
        Self {
            id: None,
            inputs: vec![InferInput {
                name: input_name.to_string(),
                shape: tensor.shape(),
                datatype: FP32.to_string(),
                data: tensor.flatten(),
            }],
            outputs: vec![RequestedOutput {
                name: output_name.to_string(),
            }],
        }
    }

    /// Attach a request id; the server echoes it in the response
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// One output tensor in an inference response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferOutput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub shape: Option<Vec<usize>>,
    #[serde(default)]
    pub datatype: Option<String>,
    /// One score per class
    pub data: Vec<f64>,
}

/// Body returned by a successful inference call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub model_version: Option<String>,
    #[serde(default)]
    pub outputs: Vec<InferOutput>,
}

impl InferenceResponse {
    /// Scores of the first output
    pub fn first_scores(&self) -> Result<&[f64], ClientError> {
        self.outputs
            .first()
            .map(|output| output.data.as_slice())
            .ok_or(ClientError::EmptyOutputs)
    }

    /// Rank the first output's scores, highest first
    pub fn top_k(&self, k: usize) -> Result<Vec<Prediction>, ClientError> {
        Ok(top_k(self.first_scores()?, k))
    }
}
