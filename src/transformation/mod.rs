//! Data transformation stage
//!
//! Separates the label from the validated tables, remaps the legacy `-1`
//! label to `0`, fits the KNN imputer on the train features only and applies
//! it to both splits. The fitted imputer is serialized next to the
//! transformed tables so inference can reuse the exact same preprocessing.

mod imputer;

pub use imputer::KnnImputer;

use crate::artifact::{DataTransformationArtifact, DataValidationArtifact};
use crate::config::DataTransformationConfig;
use crate::data::{column_to_array1, columns_to_array2, load_csv, save_csv};
use crate::error::{PhishGuardError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs;
use std::path::Path;
use tracing::info;

/// Data transformation stage
pub struct DataTransformation {
    config: DataTransformationConfig,
    validation: DataValidationArtifact,
}

impl DataTransformation {
    pub fn new(config: DataTransformationConfig, validation: DataValidationArtifact) -> Self {
        Self { config, validation }
    }

    /// Run the stage: split off the label, impute, persist tables and imputer
    pub fn run(&self) -> Result<DataTransformationArtifact> {
        let train = load_csv(&self.validation.valid_train_path)?;
        let test = load_csv(&self.validation.valid_test_path)?;

        let feature_names = self.feature_names(&train)?;
        let x_train = columns_to_array2(&train, &feature_names)?;
        let x_test = columns_to_array2(&test, &feature_names)?;
        let y_train = self.labels(&train)?;
        let y_test = self.labels(&test)?;

        let mut imputer = KnnImputer::new(self.config.imputer_neighbors);
        let x_train = imputer.fit_transform(&x_train)?;
        let x_test = imputer.transform(&x_test)?;
        for (name, x) in [("train", &x_train), ("test", &x_test)] {
            if x.iter().any(|v| !v.is_finite()) {
                return Err(PhishGuardError::Data(format!(
                    "{name} features still hold non-finite values after imputation"
                )));
            }
        }

        let mut train_out = self.assemble(&feature_names, &x_train, &y_train)?;
        let mut test_out = self.assemble(&feature_names, &x_test, &y_test)?;
        save_csv(&mut train_out, &self.config.transformed_train_path)?;
        save_csv(&mut test_out, &self.config.transformed_test_path)?;
        self.save_imputer(&imputer, &self.config.transformed_object_path)?;
        info!(
            train_rows = train_out.height(),
            test_rows = test_out.height(),
            features = feature_names.len(),
            "transformation complete"
        );

        Ok(DataTransformationArtifact {
            transformed_object_path: self.config.transformed_object_path.clone(),
            transformed_train_path: self.config.transformed_train_path.clone(),
            transformed_test_path: self.config.transformed_test_path.clone(),
        })
    }

    /// All columns except the label, in table order
    fn feature_names(&self, df: &DataFrame) -> Result<Vec<String>> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .filter(|s| s != &self.config.target_column)
            .collect();
        if names.is_empty() {
            return Err(PhishGuardError::Data(
                "no feature columns besides the label".to_string(),
            ));
        }
        Ok(names)
    }

    /// Label vector with the legacy `-1` class remapped to `0`
    fn labels(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let raw = column_to_array1(df, &self.config.target_column)?;
        raw.iter()
            .map(|&v| {
                if v.is_nan() {
                    Err(PhishGuardError::Data(format!(
                        "missing value in label column '{}'",
                        self.config.target_column
                    )))
                } else if v == -1.0 {
                    Ok(0.0)
                } else {
                    Ok(v)
                }
            })
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from_vec)
    }

    fn assemble(
        &self,
        feature_names: &[String],
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<DataFrame> {
        let mut columns: Vec<Column> = feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let values: Vec<f64> = x.column(j).iter().copied().collect();
                Column::new(name.as_str().into(), values)
            })
            .collect();
        columns.push(Column::new(
            self.config.target_column.as_str().into(),
            y.to_vec(),
        ));
        DataFrame::new(columns).map_err(|e| PhishGuardError::Data(e.to_string()))
    }

    fn save_imputer(&self, imputer: &KnnImputer, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(imputer)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingPipelineConfig;
    use tempfile::TempDir;

    fn write_tables(dir: &TempDir) -> DataValidationArtifact {
        let mut train = DataFrame::new(vec![
            Column::new("f1".into(), &[Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)]),
            Column::new("f2".into(), &[Some(10.0), Some(20.0), Some(30.0), Some(40.0), Some(50.0)]),
            Column::new("result".into(), &[1.0, -1.0, 1.0, -1.0, 1.0]),
        ])
        .unwrap();
        let mut test = DataFrame::new(vec![
            Column::new("f1".into(), &[Some(1.5), None]),
            Column::new("f2".into(), &[Some(15.0), Some(25.0)]),
            Column::new("result".into(), &[-1.0, 1.0]),
        ])
        .unwrap();

        let train_path = dir.path().join("valid/train.csv");
        let test_path = dir.path().join("valid/test.csv");
        save_csv(&mut train, &train_path).unwrap();
        save_csv(&mut test, &test_path).unwrap();

        DataValidationArtifact {
            validation_status: true,
            valid_train_path: train_path,
            valid_test_path: test_path,
            invalid_train_path: None,
            invalid_test_path: None,
            drift_report_path: dir.path().join("report.yaml"),
        }
    }

    fn stage(dir: &TempDir) -> DataTransformation {
        let pipeline = TrainingPipelineConfig::with_timestamp(&dir.path().join("artifacts"), "ts");
        let config = DataTransformationConfig::new(&pipeline).with_imputer_neighbors(2);
        DataTransformation::new(config, write_tables(dir))
    }

    #[test]
    fn test_outputs_have_no_missing_values() {
        let dir = TempDir::new().unwrap();
        let artifact = stage(&dir).run().unwrap();

        for path in [&artifact.transformed_train_path, &artifact.transformed_test_path] {
            let df = load_csv(path).unwrap();
            for col in df.get_columns() {
                assert_eq!(col.null_count(), 0, "{path:?}");
            }
        }
    }

    #[test]
    fn test_labels_remapped_to_binary() {
        let dir = TempDir::new().unwrap();
        let artifact = stage(&dir).run().unwrap();

        let df = load_csv(&artifact.transformed_train_path).unwrap();
        let y = column_to_array1(&df, "result").unwrap();
        assert!(y.iter().all(|&v| v == 0.0 || v == 1.0));
        assert_eq!(y.to_vec(), vec![1.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_imputer_is_persisted_and_loadable() {
        let dir = TempDir::new().unwrap();
        let artifact = stage(&dir).run().unwrap();

        let json = std::fs::read_to_string(&artifact.transformed_object_path).unwrap();
        let imputer: KnnImputer = serde_json::from_str(&json).unwrap();
        assert!(imputer.is_fitted());

        let sample = Array2::from_shape_vec((1, 2), vec![f64::NAN, 22.0]).unwrap();
        let filled = imputer.transform(&sample).unwrap();
        assert!(filled[[0, 0]].is_finite());
    }
}
