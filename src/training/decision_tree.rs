//! CART-style decision tree classifier with Gini impurity splits

use crate::error::{PhishGuardError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum TreeNode {
    /// Leaf with the majority class
    Leaf { prediction: f64 },
    /// Internal split
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Binary decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: usize,
    /// Minimum samples to split
    pub min_samples_split: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: 10,
            min_samples_split: 2,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(PhishGuardError::Data(
                "cannot fit a tree on an empty matrix".to_string(),
            ));
        }
        if y.len() != n_samples {
            return Err(PhishGuardError::Shape {
                expected: format!("{n_samples} labels"),
                actual: format!("{} labels", y.len()),
            });
        }

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build(x, y, &indices, 0));
        Ok(())
    }

    fn build(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize], depth: usize) -> TreeNode {
        let positives = indices.iter().filter(|&&i| y[i] == 1.0).count();
        let prediction = if 2 * positives >= indices.len() { 1.0 } else { 0.0 };

        let pure = positives == 0 || positives == indices.len();
        if pure || depth >= self.max_depth || indices.len() < self.min_samples_split {
            return TreeNode::Leaf { prediction };
        }

        match Self::best_split(x, y, indices) {
            Some((feature, threshold)) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
                    indices.iter().partition(|&&i| x[[i, feature]] <= threshold);
                if left_idx.is_empty() || right_idx.is_empty() {
                    return TreeNode::Leaf { prediction };
                }
                TreeNode::Split {
                    feature,
                    threshold,
                    left: Box::new(self.build(x, y, &left_idx, depth + 1)),
                    right: Box::new(self.build(x, y, &right_idx, depth + 1)),
                }
            }
            None => TreeNode::Leaf { prediction },
        }
    }

    fn gini(positives: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let p = positives as f64 / total as f64;
        2.0 * p * (1.0 - p)
    }

    /// Exhaustive scan over midpoints of adjacent distinct feature values
    fn best_split(x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Option<(usize, f64)> {
        let total = indices.len();
        let parent_pos = indices.iter().filter(|&&i| y[i] == 1.0).count();
        let parent_gini = Self::gini(parent_pos, total);

        let mut best: Option<(f64, usize, f64)> = None;
        for feature in 0..x.ncols() {
            let mut ordered: Vec<(f64, f64)> =
                indices.iter().map(|&i| (x[[i, feature]], y[i])).collect();
            ordered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

            let mut left_pos = 0usize;
            for split_at in 1..total {
                if ordered[split_at - 1].1 == 1.0 {
                    left_pos += 1;
                }
                if ordered[split_at].0 == ordered[split_at - 1].0 {
                    continue;
                }

                let left_total = split_at;
                let right_total = total - split_at;
                let right_pos = parent_pos - left_pos;
                let weighted = (left_total as f64 * Self::gini(left_pos, left_total)
                    + right_total as f64 * Self::gini(right_pos, right_total))
                    / total as f64;
                let gain = parent_gini - weighted;

                if gain > 1e-12 && best.map_or(true, |(g, _, _)| gain > g) {
                    let threshold = (ordered[split_at - 1].0 + ordered[split_at].0) / 2.0;
                    best = Some((gain, feature, threshold));
                }
            }
        }
        best.map(|(_, feature, threshold)| (feature, threshold))
    }

    fn predict_row(node: &TreeNode, row: &ArrayView1<f64>) -> f64 {
        match node {
            TreeNode::Leaf { prediction } => *prediction,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    Self::predict_row(left, row)
                } else {
                    Self::predict_row(right, row)
                }
            }
        }
    }

    /// Predict class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(PhishGuardError::ModelNotFitted)?;
        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| Self::predict_row(root, &row))
            .collect();
        Ok(Array1::from_vec(predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xor_data() -> (Array2<f64>, Array1<f64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for &(a, b) in &[(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
            for _ in 0..5 {
                rows.extend_from_slice(&[a, b]);
                labels.push(if (a == 1.0) != (b == 1.0) { 1.0 } else { 0.0 });
            }
        }
        (
            Array2::from_shape_vec((20, 2), rows).unwrap(),
            Array1::from_vec(labels),
        )
    }

    #[test]
    fn test_fits_xor() {
        let (x, y) = xor_data();
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_pure_node_stops_early() {
        let x = Array2::from_shape_vec((4, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let y = Array1::from_vec(vec![1.0, 1.0, 1.0, 1.0]);
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();
        assert!(matches!(tree.root, Some(TreeNode::Leaf { prediction }) if prediction == 1.0));
    }

    #[test]
    fn test_depth_one_is_a_stump() {
        let (x, y) = xor_data();
        let mut stump = DecisionTree::new().with_max_depth(1);
        stump.fit(&x, &y).unwrap();
        match &stump.root {
            Some(TreeNode::Split { left, right, .. }) => {
                assert!(matches!(**left, TreeNode::Leaf { .. }));
                assert!(matches!(**right, TreeNode::Leaf { .. }));
            }
            Some(TreeNode::Leaf { .. }) => {}
            None => panic!("tree not fitted"),
        }
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let tree = DecisionTree::new();
        let x = Array2::zeros((1, 2));
        assert!(matches!(
            tree.predict(&x),
            Err(PhishGuardError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_serde_roundtrip_preserves_predictions() {
        let (x, y) = xor_data();
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let json = serde_json::to_string(&tree).unwrap();
        let restored: DecisionTree = serde_json::from_str(&json).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), restored.predict(&x).unwrap());
    }
}
