//! Random forest classifier over bootstrap-resampled decision trees

use super::decision_tree::DecisionTree;
use crate::error::{PhishGuardError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random forest classifier
///
/// Trees are fitted in parallel on bootstrap samples drawn from a seeded
/// generator, so the same seed always produces the same forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: usize,
    /// Seed for bootstrap sampling
    pub random_seed: u64,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(50)
    }
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators: n_estimators.max(1),
            max_depth: 10,
            random_seed: 42,
        }
    }

    /// Set maximum depth per tree
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    /// Set the bootstrap seed
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(PhishGuardError::Data(
                "cannot fit a forest on an empty matrix".to_string(),
            ));
        }
        if y.len() != n_samples {
            return Err(PhishGuardError::Shape {
                expected: format!("{n_samples} labels"),
                actual: format!("{} labels", y.len()),
            });
        }

        // Draw all bootstrap index sets up front so tree fitting can run in
        // parallel without sharing the generator.
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_seed);
        let samples: Vec<Vec<usize>> = (0..self.n_estimators)
            .map(|_| (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect())
            .collect();

        let max_depth = self.max_depth;
        self.trees = samples
            .into_par_iter()
            .map(|indices| {
                let x_boot = x.select(Axis(0), &indices);
                let y_boot = Array1::from_vec(indices.iter().map(|&i| y[i]).collect());
                let mut tree = DecisionTree::new().with_max_depth(max_depth);
                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect::<Result<Vec<DecisionTree>>>()?;
        Ok(())
    }

    /// Predict by majority vote across the trees
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PhishGuardError::ModelNotFitted);
        }

        let votes: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<Array1<f64>>>>()?;

        let n = x.nrows();
        let predictions: Vec<f64> = (0..n)
            .map(|i| {
                let positives = votes.iter().filter(|v| v[i] == 1.0).count();
                if 2 * positives >= self.trees.len() {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        Ok(Array1::from_vec(predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            let jitter = (i % 5) as f64 * 0.05;
            rows.extend_from_slice(&[-1.0 - jitter, 0.0]);
            labels.push(0.0);
            rows.extend_from_slice(&[1.0 + jitter, 0.0]);
            labels.push(1.0);
        }
        (
            Array2::from_shape_vec((60, 2), rows).unwrap(),
            Array1::from_vec(labels),
        )
    }

    #[test]
    fn test_learns_separable_data() {
        let (x, y) = separable();
        let mut forest = RandomForest::new(10);
        forest.fit(&x, &y).unwrap();
        assert_eq!(forest.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = separable();
        let mut a = RandomForest::new(10).with_random_seed(7);
        let mut b = RandomForest::new(10).with_random_seed(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let forest = RandomForest::new(5);
        let x = Array2::zeros((1, 2));
        assert!(matches!(
            forest.predict(&x),
            Err(PhishGuardError::ModelNotFitted)
        ));
    }
}
