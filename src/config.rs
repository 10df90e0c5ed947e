//! Pipeline and per-stage configuration
//!
//! Every stage derives its file paths from the timestamped run directory
//! held by [`TrainingPipelineConfig`]. Thresholds default to the values the
//! original deployment used but stay configurable through builder methods.

use chrono::Local;
use std::path::{Path, PathBuf};

/// Root directory for run artifacts
pub const ARTIFACT_ROOT: &str = "artifacts";
/// Feature-store file name (full ingested table before splitting)
pub const FEATURE_STORE_FILE: &str = "phishing.csv";
/// Train split file name
pub const TRAIN_FILE: &str = "train.csv";
/// Test split file name
pub const TEST_FILE: &str = "test.csv";
/// Drift report file name
pub const DRIFT_REPORT_FILE: &str = "report.yaml";
/// Serialized imputer file name
pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
/// Serialized model bundle file name
pub const MODEL_FILE: &str = "model.json";
/// Schema definition file name
pub const SCHEMA_FILE: &str = "schema.yaml";
/// Label column of the phishing dataset
pub const TARGET_COLUMN: &str = "result";
/// Identifier field injected by the document store
pub const ID_COLUMN: &str = "_id";

/// Top-level configuration: one timestamped directory per run
#[derive(Debug, Clone)]
pub struct TrainingPipelineConfig {
    /// Pipeline name, used for logging only
    pub pipeline_name: String,
    /// Run timestamp, e.g. `20260824_153000`
    pub timestamp: String,
    /// Directory all stage artifacts live under
    pub run_dir: PathBuf,
}

impl TrainingPipelineConfig {
    /// Create a config with the current local time as timestamp
    pub fn new() -> Self {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        Self::with_timestamp(Path::new(ARTIFACT_ROOT), &timestamp)
    }

    /// Create a config with an explicit root and timestamp (used by tests)
    pub fn with_timestamp(artifact_root: &Path, timestamp: &str) -> Self {
        Self {
            pipeline_name: "phishguard".to_string(),
            timestamp: timestamp.to_string(),
            run_dir: artifact_root.join(timestamp),
        }
    }
}

impl Default for TrainingPipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the ingestion stage
#[derive(Debug, Clone)]
pub struct DataIngestionConfig {
    /// Document store database name
    pub database: String,
    /// Document store collection name
    pub collection: String,
    /// Full ingested table, prior to splitting
    pub feature_store_path: PathBuf,
    /// Train split output
    pub train_path: PathBuf,
    /// Test split output
    pub test_path: PathBuf,
    /// Fraction of rows going to the test split
    pub test_split_ratio: f64,
    /// Seed for the shuffle before splitting
    pub random_seed: u64,
    /// Tokens treated as missing values
    pub missing_tokens: Vec<String>,
}

impl DataIngestionConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let dir = pipeline.run_dir.join("data_ingestion");
        Self {
            database: "phishguard".to_string(),
            collection: "phishing_data".to_string(),
            feature_store_path: dir.join("feature_store").join(FEATURE_STORE_FILE),
            train_path: dir.join("ingested").join(TRAIN_FILE),
            test_path: dir.join("ingested").join(TEST_FILE),
            test_split_ratio: 0.2,
            random_seed: 42,
            missing_tokens: vec!["na".to_string(), "NA".to_string(), String::new()],
        }
    }

    pub fn with_collection(mut self, database: &str, collection: &str) -> Self {
        self.database = database.to_string();
        self.collection = collection.to_string();
        self
    }

    pub fn with_split_ratio(mut self, ratio: f64) -> Self {
        self.test_split_ratio = ratio.clamp(0.05, 0.5);
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }
}

/// Configuration for the validation stage
#[derive(Debug, Clone)]
pub struct DataValidationConfig {
    /// Train table copied forward when the schema check passes
    pub valid_train_path: PathBuf,
    /// Test table copied forward when the schema check passes
    pub valid_test_path: PathBuf,
    /// Train table parked here when the schema check fails
    pub invalid_train_path: PathBuf,
    /// Test table parked here when the schema check fails
    pub invalid_test_path: PathBuf,
    /// Per-column drift report
    pub drift_report_path: PathBuf,
    /// Expected-column schema definition
    pub schema_path: PathBuf,
    /// Significance level: drift is flagged when p-value falls below this
    pub drift_p_value_threshold: f64,
}

impl DataValidationConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let dir = pipeline.run_dir.join("data_validation");
        Self {
            valid_train_path: dir.join("validated").join(TRAIN_FILE),
            valid_test_path: dir.join("validated").join(TEST_FILE),
            invalid_train_path: dir.join("invalid").join(TRAIN_FILE),
            invalid_test_path: dir.join("invalid").join(TEST_FILE),
            drift_report_path: dir.join("drift_report").join(DRIFT_REPORT_FILE),
            schema_path: PathBuf::from(SCHEMA_FILE),
            drift_p_value_threshold: 0.05,
        }
    }

    pub fn with_schema_path(mut self, path: &Path) -> Self {
        self.schema_path = path.to_path_buf();
        self
    }

    pub fn with_drift_threshold(mut self, p_value: f64) -> Self {
        self.drift_p_value_threshold = p_value.clamp(0.001, 0.5);
        self
    }
}

/// Configuration for the transformation stage
#[derive(Debug, Clone)]
pub struct DataTransformationConfig {
    /// Transformed train table (imputed features + remapped target)
    pub transformed_train_path: PathBuf,
    /// Transformed test table
    pub transformed_test_path: PathBuf,
    /// Fitted imputer, serialized for inference-time reuse
    pub transformed_object_path: PathBuf,
    /// Label column separated out before imputation
    pub target_column: String,
    /// Neighbor count for the KNN imputer
    pub imputer_neighbors: usize,
}

impl DataTransformationConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let dir = pipeline.run_dir.join("data_transformation");
        Self {
            transformed_train_path: dir.join("transformed").join(TRAIN_FILE),
            transformed_test_path: dir.join("transformed").join(TEST_FILE),
            transformed_object_path: dir.join("transformed_object").join(PREPROCESSOR_FILE),
            target_column: TARGET_COLUMN.to_string(),
            imputer_neighbors: 3,
        }
    }

    pub fn with_imputer_neighbors(mut self, n: usize) -> Self {
        self.imputer_neighbors = n.max(1);
        self
    }
}

/// Configuration for the trainer stage
#[derive(Debug, Clone)]
pub struct ModelTrainerConfig {
    /// Serialized model bundle (imputer + classifier)
    pub trained_model_path: PathBuf,
    /// Minimum acceptable test F1 score
    pub expected_score: f64,
    /// Maximum acceptable train-minus-test F1 gap
    pub max_fit_gap: f64,
    /// Seed for the candidate models that need one
    pub random_seed: u64,
}

impl ModelTrainerConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let dir = pipeline.run_dir.join("model_trainer");
        Self {
            trained_model_path: dir.join("trained_model").join(MODEL_FILE),
            expected_score: 0.6,
            max_fit_gap: 0.05,
            random_seed: 42,
        }
    }

    pub fn with_expected_score(mut self, score: f64) -> Self {
        self.expected_score = score.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_fit_gap(mut self, gap: f64) -> Self {
        self.max_fit_gap = gap.clamp(0.0, 1.0);
        self
    }
}
