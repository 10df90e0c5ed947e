//! Nearest-neighbor imputation for missing feature values

use crate::error::{PhishGuardError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[inline]
pub fn is_missing(v: f64) -> bool {
    v.is_nan()
}

/// KNN imputer: fills a missing value with the uniform average of that
/// feature over the k nearest complete training rows
///
/// Distances are euclidean over the positions observed in both rows,
/// normalized by the number of observed positions. Rows sharing no observed
/// position fall back to the training feature mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnImputer {
    n_neighbors: usize,
    complete_rows: Option<Array2<f64>>,
    feature_means: Option<Array1<f64>>,
}

impl KnnImputer {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            complete_rows: None,
            feature_means: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.complete_rows.is_some()
    }

    /// Mean distance over positions observed in both rows
    fn distance(a: &[f64], b: &[f64]) -> f64 {
        let mut observed = 0usize;
        let mut accum = 0.0f64;
        for (&ai, &bi) in a.iter().zip(b.iter()) {
            if is_missing(ai) || is_missing(bi) {
                continue;
            }
            let d = ai - bi;
            accum += d * d;
            observed += 1;
        }
        if observed == 0 {
            f64::INFINITY
        } else {
            (accum / observed as f64).sqrt()
        }
    }

    /// Remember the complete training rows and per-feature means
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let complete: Vec<usize> = x
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| !row.iter().any(|&v| is_missing(v)))
            .map(|(i, _)| i)
            .collect();

        if complete.is_empty() {
            return Err(PhishGuardError::Data(
                "no complete rows available to fit the imputer".to_string(),
            ));
        }

        let rows = x.select(Axis(0), &complete);
        let means = rows
            .mean_axis(Axis(0))
            .ok_or_else(|| PhishGuardError::Data("cannot compute feature means".to_string()))?;

        self.complete_rows = Some(rows);
        self.feature_means = Some(means);
        Ok(())
    }

    /// Replace every missing value; the result carries no NaN
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let complete = self.complete_rows.as_ref().ok_or(PhishGuardError::ModelNotFitted)?;
        let means = self.feature_means.as_ref().ok_or(PhishGuardError::ModelNotFitted)?;

        if x.ncols() != complete.ncols() {
            return Err(PhishGuardError::Shape {
                expected: format!("{} features", complete.ncols()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let mut result = x.to_owned();
        for (row_idx, row) in x.rows().into_iter().enumerate() {
            if !row.iter().any(|&v| is_missing(v)) {
                continue;
            }
            let sample: Vec<f64> = row.iter().copied().collect();

            let mut ranked: Vec<(f64, usize)> = complete
                .rows()
                .into_iter()
                .enumerate()
                .filter_map(|(i, r)| {
                    let d = Self::distance(&sample, r.as_slice().unwrap_or(&[]));
                    d.is_finite().then_some((d, i))
                })
                .collect();
            ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
            ranked.truncate(self.n_neighbors);

            for (j, &value) in sample.iter().enumerate() {
                if !is_missing(value) {
                    continue;
                }
                result[[row_idx, j]] = if ranked.is_empty() {
                    means[j]
                } else {
                    ranked.iter().map(|&(_, i)| complete[[i, j]]).sum::<f64>()
                        / ranked.len() as f64
                };
            }
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}
