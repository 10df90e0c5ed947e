//! Model training stage
//!
//! Fits the candidate classifiers on the transformed train split, scores
//! every candidate on both splits and keeps the one with the best test F1.
//! The winner must clear the acceptance thresholds before it is bundled with
//! the fitted imputer and written to disk.

pub mod decision_tree;
pub mod logistic;
pub mod metrics;
pub mod random_forest;

pub use decision_tree::DecisionTree;
pub use logistic::LogisticRegression;
pub use metrics::ClassificationMetrics;
pub use random_forest::RandomForest;

use crate::artifact::{DataTransformationArtifact, ModelTrainerArtifact};
use crate::config::{ModelTrainerConfig, TARGET_COLUMN};
use crate::data::{column_to_array1, columns_to_array2, load_csv};
use crate::error::{PhishGuardError, Result};
use crate::transformation::KnnImputer;
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// A fitted candidate, dispatched by variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model")]
pub enum TrainedClassifier {
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl TrainedClassifier {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LogisticRegression(_) => "logistic_regression",
            Self::DecisionTree(_) => "decision_tree",
            Self::RandomForest(_) => "random_forest",
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Self::LogisticRegression(m) => m.predict(x),
            Self::DecisionTree(m) => m.predict(x),
            Self::RandomForest(m) => m.predict(x),
        }
    }
}

/// Deployable bundle: the fitted imputer plus the selected classifier
///
/// Raw feature rows go through the same imputation the training data saw
/// before they reach the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhishingModel {
    pub imputer: KnnImputer,
    pub classifier: TrainedClassifier,
}

impl PhishingModel {
    /// Impute then classify raw feature rows
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let filled = self.imputer.transform(x)?;
        self.classifier.predict(&filled)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Model training stage
pub struct ModelTrainer {
    config: ModelTrainerConfig,
    transformation: DataTransformationArtifact,
}

struct Candidate {
    classifier: TrainedClassifier,
    train_metrics: ClassificationMetrics,
    test_metrics: ClassificationMetrics,
}

impl ModelTrainer {
    pub fn new(config: ModelTrainerConfig, transformation: DataTransformationArtifact) -> Self {
        Self {
            config,
            transformation,
        }
    }

    /// Run the stage: fit candidates, select, gate, persist
    pub fn run(&self) -> Result<ModelTrainerArtifact> {
        let train = load_csv(&self.transformation.transformed_train_path)?;
        let test = load_csv(&self.transformation.transformed_test_path)?;

        let feature_names = feature_names(&train)?;
        let x_train = columns_to_array2(&train, &feature_names)?;
        let y_train = column_to_array1(&train, TARGET_COLUMN)?;
        let x_test = columns_to_array2(&test, &feature_names)?;
        let y_test = column_to_array1(&test, TARGET_COLUMN)?;

        let candidates = self.fit_candidates(&x_train, &y_train, &x_test, &y_test)?;
        let best = candidates
            .into_iter()
            .max_by(|a, b| {
                a.test_metrics
                    .f1_score
                    .total_cmp(&b.test_metrics.f1_score)
            })
            .ok_or_else(|| PhishGuardError::Data("no candidate models fitted".to_string()))?;
        info!(
            model = best.classifier.name(),
            train_f1 = best.train_metrics.f1_score,
            test_f1 = best.test_metrics.f1_score,
            "selected best candidate"
        );

        self.check_thresholds(&best)?;

        let imputer_json = fs::read_to_string(&self.transformation.transformed_object_path)?;
        let imputer: KnnImputer = serde_json::from_str(&imputer_json)?;
        let model = PhishingModel {
            imputer,
            classifier: best.classifier,
        };
        model.save(&self.config.trained_model_path)?;
        info!(path = %self.config.trained_model_path.display(), "model bundle written");

        Ok(ModelTrainerArtifact {
            trained_model_path: self.config.trained_model_path.clone(),
            train_metrics: best.train_metrics,
            test_metrics: best.test_metrics,
        })
    }

    fn fit_candidates(
        &self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<Vec<Candidate>> {
        let mut fitted = Vec::with_capacity(3);

        let mut logistic = LogisticRegression::default();
        logistic.fit(x_train, y_train)?;
        fitted.push(TrainedClassifier::LogisticRegression(logistic));

        let mut tree = DecisionTree::new();
        tree.fit(x_train, y_train)?;
        fitted.push(TrainedClassifier::DecisionTree(tree));

        let mut forest = RandomForest::default().with_random_seed(self.config.random_seed);
        forest.fit(x_train, y_train)?;
        fitted.push(TrainedClassifier::RandomForest(forest));

        fitted
            .into_iter()
            .map(|classifier| {
                let train_metrics =
                    ClassificationMetrics::compute(y_train, &classifier.predict(x_train)?)?;
                let test_metrics =
                    ClassificationMetrics::compute(y_test, &classifier.predict(x_test)?)?;
                info!(
                    model = classifier.name(),
                    train_f1 = train_metrics.f1_score,
                    test_f1 = test_metrics.f1_score,
                    "candidate scored"
                );
                Ok(Candidate {
                    classifier,
                    train_metrics,
                    test_metrics,
                })
            })
            .collect()
    }

    /// Reject underperforming or overfitted winners
    fn check_thresholds(&self, best: &Candidate) -> Result<()> {
        if best.test_metrics.f1_score < self.config.expected_score {
            return Err(PhishGuardError::ThresholdViolation {
                name: "expected_score".to_string(),
                value: best.test_metrics.f1_score,
                limit: self.config.expected_score,
            });
        }
        let gap = best.train_metrics.f1_score - best.test_metrics.f1_score;
        if gap > self.config.max_fit_gap {
            return Err(PhishGuardError::ThresholdViolation {
                name: "fit_gap".to_string(),
                value: gap,
                limit: self.config.max_fit_gap,
            });
        }
        Ok(())
    }
}

fn feature_names(df: &DataFrame) -> Result<Vec<String>> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .filter(|s| s != TARGET_COLUMN)
        .collect();
    if names.is_empty() {
        return Err(PhishGuardError::Data(
            "no feature columns besides the label".to_string(),
        ));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingPipelineConfig;
    use crate::data::save_csv;
    use polars::prelude::*;
    use tempfile::TempDir;

    fn write_split(
        dir: &TempDir,
        test_label: impl Fn(usize) -> f64,
    ) -> DataTransformationArtifact {
        let train_f: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { -2.0 - (i as f64) * 0.01 } else { 2.0 + (i as f64) * 0.01 }).collect();
        let train_y: Vec<f64> = (0..40).map(|i| (i % 2) as f64).collect();
        let test_f: Vec<f64> = (0..10).map(|i| if i % 2 == 0 { -3.0 } else { 3.0 }).collect();
        let test_y: Vec<f64> = (0..10).map(|i| test_label(i)).collect();

        let mut train = DataFrame::new(vec![
            Column::new("f1".into(), train_f),
            Column::new("result".into(), train_y),
        ])
        .unwrap();
        let mut test = DataFrame::new(vec![
            Column::new("f1".into(), test_f),
            Column::new("result".into(), test_y),
        ])
        .unwrap();

        let train_path = dir.path().join("transformed/train.csv");
        let test_path = dir.path().join("transformed/test.csv");
        save_csv(&mut train, &train_path).unwrap();
        save_csv(&mut test, &test_path).unwrap();

        let mut imputer = KnnImputer::new(3);
        let x = columns_to_array2(&train.clone(), &["f1".to_string()]).unwrap();
        imputer.fit(&x).unwrap();
        let imputer_path = dir.path().join("transformed_object/preprocessor.json");
        std::fs::create_dir_all(imputer_path.parent().unwrap()).unwrap();
        std::fs::write(&imputer_path, serde_json::to_string_pretty(&imputer).unwrap()).unwrap();

        DataTransformationArtifact {
            transformed_object_path: imputer_path,
            transformed_train_path: train_path,
            transformed_test_path: test_path,
        }
    }

    fn trainer(dir: &TempDir, test_label: impl Fn(usize) -> f64) -> ModelTrainer {
        let pipeline = TrainingPipelineConfig::with_timestamp(&dir.path().join("artifacts"), "ts");
        let config = ModelTrainerConfig::new(&pipeline);
        ModelTrainer::new(config, write_split(dir, test_label))
    }

    #[test]
    fn test_trains_and_persists_bundle() {
        let dir = TempDir::new().unwrap();
        let artifact = trainer(&dir, |i| (i % 2) as f64).run().unwrap();

        assert!(artifact.trained_model_path.exists());
        assert_eq!(artifact.test_metrics.f1_score, 1.0);
        assert!(artifact.train_metrics.f1_score - artifact.test_metrics.f1_score <= 0.05);
    }

    #[test]
    fn test_bundle_predicts_raw_rows() {
        let dir = TempDir::new().unwrap();
        let artifact = trainer(&dir, |i| (i % 2) as f64).run().unwrap();

        let model = PhishingModel::load(&artifact.trained_model_path).unwrap();
        let x = Array2::from_shape_vec((3, 1), vec![-5.0, 5.0, f64::NAN]).unwrap();
        let pred = model.predict(&x).unwrap();
        assert_eq!(pred[0], 0.0);
        assert_eq!(pred[1], 1.0);
        assert!(pred[2] == 0.0 || pred[2] == 1.0);
    }

    #[test]
    fn test_low_test_score_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = trainer(&dir, |i| 1.0 - (i % 2) as f64).run().unwrap_err();
        assert!(matches!(
            err,
            PhishGuardError::ThresholdViolation { ref name, .. } if name == "expected_score"
        ));
    }

    #[test]
    fn test_overfit_gap_is_rejected() {
        let dir = TempDir::new().unwrap();
        // Two positive-side test rows labeled 0: every candidate scores
        // train F1 1.0 but test F1 0.75, beyond the 0.05 gap while still
        // clearing the 0.6 score floor.
        let err = trainer(&dir, |i| {
            if i == 1 || i == 3 {
                0.0
            } else {
                (i % 2) as f64
            }
        })
        .run()
        .unwrap_err();
        assert!(matches!(
            err,
            PhishGuardError::ThresholdViolation { ref name, .. } if name == "fit_gap"
        ));
    }
}
