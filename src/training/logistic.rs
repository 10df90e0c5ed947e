//! Logistic regression trained by batch gradient descent

use crate::error::{PhishGuardError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Binary logistic regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    learning_rate: f64,
    max_iterations: usize,
    tolerance: f64,
    weights: Option<Array1<f64>>,
    bias: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(0.1, 1000, 1e-6)
    }
}

impl LogisticRegression {
    pub fn new(learning_rate: f64, max_iterations: usize, tolerance: f64) -> Self {
        Self {
            learning_rate,
            max_iterations,
            tolerance,
            weights: None,
            bias: 0.0,
        }
    }

    fn sigmoid(z: f64) -> f64 {
        if z >= 0.0 {
            1.0 / (1.0 + (-z).exp())
        } else {
            let e = z.exp();
            e / (1.0 + e)
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let (n, d) = x.dim();
        if n == 0 || d == 0 {
            return Err(PhishGuardError::Data(
                "cannot fit logistic regression on an empty matrix".to_string(),
            ));
        }
        if y.len() != n {
            return Err(PhishGuardError::Shape {
                expected: format!("{n} labels"),
                actual: format!("{} labels", y.len()),
            });
        }

        let mut weights = Array1::<f64>::zeros(d);
        let mut bias = 0.0f64;
        let inv_n = 1.0 / n as f64;

        for iteration in 0..self.max_iterations {
            let logits = x.dot(&weights) + bias;
            let probs = logits.mapv(Self::sigmoid);
            let residual = &probs - y;

            let grad_w = x.t().dot(&residual) * inv_n;
            let grad_b = residual.sum() * inv_n;

            weights.scaled_add(-self.learning_rate, &grad_w);
            bias -= self.learning_rate * grad_b;

            let grad_norm = grad_w.iter().map(|g| g * g).sum::<f64>().sqrt();
            if grad_norm < self.tolerance {
                debug!(iteration, grad_norm, "gradient descent converged");
                break;
            }
        }

        self.weights = Some(weights);
        self.bias = bias;
        Ok(())
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let weights = self.weights.as_ref().ok_or(PhishGuardError::ModelNotFitted)?;
        if x.ncols() != weights.len() {
            return Err(PhishGuardError::Shape {
                expected: format!("{} features", weights.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok((x.dot(weights) + self.bias).mapv(Self::sigmoid))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .predict_proba(x)?
            .mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}
