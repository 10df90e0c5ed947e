//! End-to-end training pipeline
//!
//! Chains ingestion, validation, transformation and training. Each stage
//! consumes the previous stage's artifact and writes its outputs under the
//! shared timestamped run directory.

use crate::artifact::ModelTrainerArtifact;
use crate::config::{
    DataIngestionConfig, DataTransformationConfig, DataValidationConfig, ModelTrainerConfig,
    TrainingPipelineConfig,
};
use crate::error::Result;
use crate::ingestion::DataIngestion;
use crate::store::DocumentStore;
use crate::training::ModelTrainer;
use crate::transformation::DataTransformation;
use crate::validation::DataValidation;
use tracing::info;

/// Runs the four pipeline stages in order
///
/// Stage configs default to the standard layout under the run directory and
/// can be swapped out through the builder methods before [`run`](Self::run).
pub struct TrainingPipeline {
    config: TrainingPipelineConfig,
    store: DocumentStore,
    ingestion: DataIngestionConfig,
    validation: DataValidationConfig,
    transformation: DataTransformationConfig,
    trainer: ModelTrainerConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingPipelineConfig, store: DocumentStore) -> Self {
        let ingestion = DataIngestionConfig::new(&config);
        let validation = DataValidationConfig::new(&config);
        let transformation = DataTransformationConfig::new(&config);
        let trainer = ModelTrainerConfig::new(&config);
        Self {
            config,
            store,
            ingestion,
            validation,
            transformation,
            trainer,
        }
    }

    pub fn config(&self) -> &TrainingPipelineConfig {
        &self.config
    }

    pub fn with_ingestion_config(mut self, config: DataIngestionConfig) -> Self {
        self.ingestion = config;
        self
    }

    pub fn with_validation_config(mut self, config: DataValidationConfig) -> Self {
        self.validation = config;
        self
    }

    pub fn with_transformation_config(mut self, config: DataTransformationConfig) -> Self {
        self.transformation = config;
        self
    }

    pub fn with_trainer_config(mut self, config: ModelTrainerConfig) -> Self {
        self.trainer = config;
        self
    }

    /// Run every stage and return the trainer's artifact
    pub fn run(&self) -> Result<ModelTrainerArtifact> {
        info!(
            pipeline = %self.config.pipeline_name,
            run_dir = %self.config.run_dir.display(),
            "starting training pipeline"
        );

        let ingestion =
            DataIngestion::new(self.ingestion.clone(), self.store.clone()).run()?;
        info!(%ingestion, "data ingestion finished");

        let validation = DataValidation::new(self.validation.clone(), ingestion).run()?;
        info!(%validation, "data validation finished");

        let transformation =
            DataTransformation::new(self.transformation.clone(), validation).run()?;
        info!(%transformation, "data transformation finished");

        let trained = ModelTrainer::new(self.trainer.clone(), transformation).run()?;
        info!(%trained, "model training finished");

        Ok(trained)
    }
}
