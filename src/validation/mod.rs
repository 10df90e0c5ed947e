//! Data validation stage
//!
//! Checks the ingested train/test tables against the external schema and
//! compares every column's train vs. test distribution with the two-sample
//! KS test. Schema mismatch aborts the run; drift is recorded in the report
//! and the overall status but does not abort (the tables are still copied
//! forward for the next stage).

mod drift;

pub use drift::{KolmogorovSmirnovTest, KsResult};

use crate::artifact::{DataIngestionArtifact, DataValidationArtifact};
use crate::config::DataValidationConfig;
use crate::data::{column_to_array1, load_csv};
use crate::error::{PhishGuardError, Result};
use crate::schema::DataSchema;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Drift verdict for one column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub column: String,
    pub statistic: f64,
    pub p_value: f64,
    pub drift_detected: bool,
}

/// Per-run drift report, written as YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    /// True iff no column drifted
    pub validation_status: bool,
    pub p_value_threshold: f64,
    pub expected_columns: usize,
    pub columns: Vec<ColumnDrift>,
}

/// Data validation stage
pub struct DataValidation {
    config: DataValidationConfig,
    ingestion: DataIngestionArtifact,
}

impl DataValidation {
    pub fn new(config: DataValidationConfig, ingestion: DataIngestionArtifact) -> Self {
        Self { config, ingestion }
    }

    /// Run the stage: schema check, drift scan, report, copy forward
    pub fn run(&self) -> Result<DataValidationArtifact> {
        let schema = DataSchema::load(&self.config.schema_path)?;
        let train = load_csv(&self.ingestion.trained_file_path)?;
        let test = load_csv(&self.ingestion.test_file_path)?;

        if let Err(err) = self.check_schema(&schema, &train, &test) {
            // Park the offending tables before surfacing the failure.
            copy_table(&self.ingestion.trained_file_path, &self.config.invalid_train_path)?;
            copy_table(&self.ingestion.test_file_path, &self.config.invalid_test_path)?;
            return Err(err);
        }

        let report = self.detect_drift(&schema, &train, &test)?;
        self.write_report(&report)?;
        if !report.validation_status {
            let drifted: Vec<&str> = report
                .columns
                .iter()
                .filter(|c| c.drift_detected)
                .map(|c| c.column.as_str())
                .collect();
            warn!(?drifted, "distribution drift detected between train and test");
        }

        copy_table(&self.ingestion.trained_file_path, &self.config.valid_train_path)?;
        copy_table(&self.ingestion.test_file_path, &self.config.valid_test_path)?;
        info!(
            status = report.validation_status,
            report = %self.config.drift_report_path.display(),
            "validation complete"
        );

        Ok(DataValidationArtifact {
            validation_status: report.validation_status,
            valid_train_path: self.config.valid_train_path.clone(),
            valid_test_path: self.config.valid_test_path.clone(),
            invalid_train_path: None,
            invalid_test_path: None,
            drift_report_path: self.config.drift_report_path.clone(),
        })
    }

    fn check_schema(&self, schema: &DataSchema, train: &DataFrame, test: &DataFrame) -> Result<()> {
        for (name, df) in [("train", train), ("test", test)] {
            if df.width() != schema.n_columns() {
                return Err(PhishGuardError::Schema(format!(
                    "{name} table has {} columns, schema expects {}",
                    df.width(),
                    schema.n_columns()
                )));
            }
            if df.column(&schema.target_column).is_err() {
                return Err(PhishGuardError::Schema(format!(
                    "{name} table is missing target column '{}'",
                    schema.target_column
                )));
            }
        }
        Ok(())
    }

    fn detect_drift(
        &self,
        schema: &DataSchema,
        train: &DataFrame,
        test: &DataFrame,
    ) -> Result<DriftReport> {
        let ks = KolmogorovSmirnovTest::new(self.config.drift_p_value_threshold);

        let mut columns = Vec::with_capacity(schema.columns.len());
        for spec in &schema.columns {
            let reference = column_to_array1(train, &spec.name)?;
            let sample = column_to_array1(test, &spec.name)?;
            let result = ks.detect(&reference, &sample)?;
            columns.push(ColumnDrift {
                column: spec.name.clone(),
                statistic: result.statistic,
                p_value: result.p_value,
                drift_detected: result.drift_detected,
            });
        }

        let validation_status = columns.iter().all(|c| !c.drift_detected);
        Ok(DriftReport {
            validation_status,
            p_value_threshold: ks.alpha(),
            expected_columns: schema.n_columns(),
            columns,
        })
    }

    fn write_report(&self, report: &DriftReport) -> Result<()> {
        let path = &self.config.drift_report_path;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_yaml::to_string(report)?;
        fs::write(path, text)?;
        Ok(())
    }
}

fn copy_table(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    Ok(())
}
