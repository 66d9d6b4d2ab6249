//! Ranking report

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tensor_prep::SourceKind;
use triton_client::Prediction;

/// Outcome of a successful probe run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub url: String,
    pub model: String,
    pub image: PathBuf,
    pub source: SourceKind,
    /// Requested number of predictions
    pub top_k: usize,
    pub request_id: Option<String>,
    pub latency_ms: u64,
    pub predictions: Vec<Prediction>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n🎯 Top {} predictions:", self.top_k)?;
        for (rank, prediction) in self.predictions.iter().enumerate() {
            writeln!(
                f,
                "  {}. Class {}: {:.4} ({:.2}%)",
                rank + 1,
                prediction.class_index,
                prediction.score,
                prediction.percent()
            )?;
        }
        Ok(())
    }
}
