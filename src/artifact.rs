//! Stage artifacts
//!
//! Each stage produces exactly one artifact record describing where its
//! outputs landed. Artifacts are plain immutable values handed to the next
//! stage and never written back.

use crate::training::metrics::ClassificationMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Output of the ingestion stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataIngestionArtifact {
    pub trained_file_path: PathBuf,
    pub test_file_path: PathBuf,
}

impl fmt::Display for DataIngestionArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataIngestionArtifact(train={}, test={})",
            self.trained_file_path.display(),
            self.test_file_path.display()
        )
    }
}

/// Output of the validation stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    /// True iff the schema check passed and no column drifted
    pub validation_status: bool,
    pub valid_train_path: PathBuf,
    pub valid_test_path: PathBuf,
    pub invalid_train_path: Option<PathBuf>,
    pub invalid_test_path: Option<PathBuf>,
    pub drift_report_path: PathBuf,
}

impl fmt::Display for DataValidationArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataValidationArtifact(status={}, report={})",
            self.validation_status,
            self.drift_report_path.display()
        )
    }
}

/// Output of the transformation stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTransformationArtifact {
    pub transformed_object_path: PathBuf,
    pub transformed_train_path: PathBuf,
    pub transformed_test_path: PathBuf,
}

impl fmt::Display for DataTransformationArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataTransformationArtifact(object={}, train={}, test={})",
            self.transformed_object_path.display(),
            self.transformed_train_path.display(),
            self.transformed_test_path.display()
        )
    }
}

/// Output of the trainer stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTrainerArtifact {
    pub trained_model_path: PathBuf,
    pub train_metrics: ClassificationMetrics,
    pub test_metrics: ClassificationMetrics,
}

impl fmt::Display for ModelTrainerArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ModelTrainerArtifact(model={}, train_f1={:.4}, test_f1={:.4})",
            self.trained_model_path.display(),
            self.train_metrics.f1_score,
            self.test_metrics.f1_score
        )
    }
}
