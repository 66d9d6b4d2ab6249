//! Top-k ranking of classification scores

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A ranked class score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Index into the model's output vector
    pub class_index: usize,
    /// Raw score as returned by the model
    pub score: f64,
}

impl Prediction {
    /// Score expressed as a percentage
    pub fn percent(&self) -> f64 {
        self.score * 100.0
    }
}

/// Return the `k` highest scores, descending.
///
/// The sort is stable over ascending indices, so equal scores keep the lower
/// class index first. NaN ranks below every number. The result has exactly
/// `min(k, scores.len())` entries.
pub fn top_k(scores: &[f64], k: usize) -> Vec<Prediction> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by(|&a, &b| descending(scores[a], scores[b]));

    indices
        .into_iter()
        .take(k)
        .map(|class_index| Prediction {
            class_index,
            score: scores[class_index],
        })
        .collect()
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
