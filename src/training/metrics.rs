//! Binary classification metrics

use crate::error::{PhishGuardError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Scores for one prediction set, positive class is `1.0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub n_samples: usize,
}

impl ClassificationMetrics {
    /// Compute accuracy, precision, recall and F1 from labels and predictions
    ///
    /// Undefined ratios (empty denominator) score zero rather than NaN.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PhishGuardError::Shape {
                expected: format!("{} labels", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(PhishGuardError::Data(
                "cannot score an empty prediction set".to_string(),
            ));
        }

        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut tn = 0usize;
        let mut fn_ = 0usize;
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t == 1.0, p == 1.0) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (false, false) => tn += 1,
                (true, false) => fn_ += 1,
            }
        }

        let n = y_true.len();
        let accuracy = (tp + tn) as f64 / n as f64;
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Ok(Self {
            accuracy,
            precision,
            recall,
            f1_score,
            n_samples: n,
        })
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
