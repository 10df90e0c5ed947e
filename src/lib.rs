//! PhishGuard - phishing URL classifier training pipeline
//!
//! A linear four-stage pipeline that turns raw phishing-detection documents
//! into a deployable classifier bundle:
//!
//! - [`ingestion`] - pull documents from the store, build the feature store,
//!   write a seeded train/test split
//! - [`validation`] - schema check and per-column KS drift detection
//! - [`transformation`] - label separation and KNN imputation
//! - [`training`] - candidate fitting, selection by test F1, acceptance gates
//!
//! [`pipeline::TrainingPipeline`] chains the stages; every run writes its
//! artifacts under one timestamped directory.

pub mod artifact;
pub mod config;
pub mod data;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod training;
pub mod transformation;
pub mod validation;

pub use error::{PhishGuardError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::artifact::{
        DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact,
        ModelTrainerArtifact,
    };
    pub use crate::config::{
        DataIngestionConfig, DataTransformationConfig, DataValidationConfig, ModelTrainerConfig,
        TrainingPipelineConfig,
    };
    pub use crate::error::{PhishGuardError, Result};
    pub use crate::pipeline::TrainingPipeline;
    pub use crate::schema::DataSchema;
    pub use crate::store::{Document, DocumentStore, STORE_URL_ENV};
    pub use crate::training::{ClassificationMetrics, PhishingModel};
    pub use crate::transformation::KnnImputer;
}
