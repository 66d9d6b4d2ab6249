//! Triton Inference Client
//!
//! Async HTTP client speaking the KServe v2 REST protocol:
//! - Server and model readiness probes
//! - Sample image download
//! - FP32 inference requests
//! - Top-k ranking of output scores

mod client;
mod protocol;
mod ranking;

#[cfg(any(test, feature = "mock-server"))]
pub mod mock;

pub use client::{ClientConfig, TritonClient, USER_AGENT};
pub use protocol::{InferInput, InferOutput, InferenceRequest, InferenceResponse, RequestedOutput};
pub use ranking::{top_k, Prediction};

use std::path::PathBuf;
use thiserror::Error;

/// Errors talking to the inference server
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection failure, timeout or unreadable body
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{target} not ready: {status}")]
    NotReady { target: String, status: u16 },

    #[error("server returned {status}\nResponse: {body}")]
    Status { status: u16, body: String },

    #[error("Sample download failed: {url} returned {status}")]
    DownloadStatus { url: String, status: u16 },

    #[error("Malformed inference response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No outputs in inference result")]
    EmptyOutputs,

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
