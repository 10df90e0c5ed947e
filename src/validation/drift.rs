//! Two-sample Kolmogorov-Smirnov test
//!
//! Compares the empirical distributions of a column in the train and test
//! splits. Drift is flagged when the asymptotic p-value falls below the
//! configured significance level.

use crate::error::{PhishGuardError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Outcome of a single two-sample comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KsResult {
    /// Maximum absolute ECDF difference
    pub statistic: f64,
    /// Asymptotic two-sided p-value
    pub p_value: f64,
    /// True when p-value < alpha
    pub drift_detected: bool,
}

/// Two-sample KS test at significance level alpha
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KolmogorovSmirnovTest {
    alpha: f64,
}

impl KolmogorovSmirnovTest {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.001, 0.5),
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Empirical CDF over sorted data
    fn ecdf(sorted_data: &[f64], x: f64) -> f64 {
        let count = sorted_data.iter().filter(|&&v| v <= x).count();
        count as f64 / sorted_data.len() as f64
    }

    /// Asymptotic survival function of the KS statistic
    ///
    /// Q(lambda) = 2 * sum_{j>=1} (-1)^(j-1) * exp(-2 j^2 lambda^2),
    /// with the small-sample correction lambda = (en + 0.12 + 0.11/en) * d.
    fn p_value(statistic: f64, n1: usize, n2: usize) -> f64 {
        // With d = 0 every series term is 1 and the alternating sum never
        // converges; identical distributions get p = 1 directly.
        if statistic <= 0.0 {
            return 1.0;
        }
        let en = ((n1 * n2) as f64 / (n1 + n2) as f64).sqrt();
        let lambda = (en + 0.12 + 0.11 / en) * statistic;

        let mut sum = 0.0;
        let mut sign = 1.0;
        for j in 1..=100 {
            let term = (-2.0 * (j as f64).powi(2) * lambda * lambda).exp();
            sum += sign * term;
            if term < 1e-10 {
                break;
            }
            sign = -sign;
        }

        (2.0 * sum).clamp(0.0, 1.0)
    }

    /// Run the test; non-finite values are dropped from both samples
    pub fn detect(&self, reference: &Array1<f64>, sample: &Array1<f64>) -> Result<KsResult> {
        let mut ref_sorted: Vec<f64> = reference.iter().copied().filter(|v| v.is_finite()).collect();
        let mut smp_sorted: Vec<f64> = sample.iter().copied().filter(|v| v.is_finite()).collect();

        if ref_sorted.is_empty() || smp_sorted.is_empty() {
            return Err(PhishGuardError::Data(
                "empty sample in drift test".to_string(),
            ));
        }

        ref_sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        smp_sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mut combined: Vec<f64> = ref_sorted.iter().chain(smp_sorted.iter()).copied().collect();
        combined.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        combined.dedup();

        let statistic = combined
            .iter()
            .map(|&x| {
                let f1 = Self::ecdf(&ref_sorted, x);
                let f2 = Self::ecdf(&smp_sorted, x);
                (f1 - f2).abs()
            })
            .fold(0.0, f64::max);

        let p_value = Self::p_value(statistic, ref_sorted.len(), smp_sorted.len());

        Ok(KsResult {
            statistic,
            p_value,
            drift_detected: p_value < self.alpha,
        })
    }
}

impl Default for KolmogorovSmirnovTest {
    fn default() -> Self {
        Self::new(0.05)
    }
}
