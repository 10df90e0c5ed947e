//! Data ingestion stage
//!
//! Pulls every document from the configured collection, flattens to a
//! numeric table, persists the feature store, and writes a seeded random
//! train/test split.

use crate::artifact::DataIngestionArtifact;
use crate::config::{DataIngestionConfig, ID_COLUMN};
use crate::data::save_csv;
use crate::error::{PhishGuardError, Result};
use crate::store::{Document, DocumentStore};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::info;

/// Data ingestion stage
pub struct DataIngestion {
    config: DataIngestionConfig,
    store: DocumentStore,
}

impl DataIngestion {
    pub fn new(config: DataIngestionConfig, store: DocumentStore) -> Self {
        Self { config, store }
    }

    /// Run the stage: fetch, flatten, persist, split
    pub fn run(&self) -> Result<DataIngestionArtifact> {
        let documents = self
            .store
            .fetch_all(&self.config.database, &self.config.collection)?;
        if documents.is_empty() {
            return Err(PhishGuardError::Data(format!(
                "collection {}/{} is empty",
                self.config.database, self.config.collection
            )));
        }

        let mut df = self.frame_from_documents(&documents)?;
        save_csv(&mut df, &self.config.feature_store_path)?;
        info!(
            rows = df.height(),
            cols = df.width(),
            path = %self.config.feature_store_path.display(),
            "feature store written"
        );

        let (mut train, mut test) = self.split(&df)?;
        save_csv(&mut train, &self.config.train_path)?;
        save_csv(&mut test, &self.config.test_path)?;
        info!(
            train_rows = train.height(),
            test_rows = test.height(),
            "train/test split written"
        );

        Ok(DataIngestionArtifact {
            trained_file_path: self.config.train_path.clone(),
            test_file_path: self.config.test_path.clone(),
        })
    }

    /// Flatten documents into one Float64 column per field
    ///
    /// The store's `_id` field is dropped and sentinel missing tokens become
    /// nulls. Columns are ordered by name so repeated runs agree.
    fn frame_from_documents(&self, documents: &[Document]) -> Result<DataFrame> {
        let mut names: BTreeSet<String> = BTreeSet::new();
        for doc in documents {
            for key in doc.keys() {
                if key != ID_COLUMN {
                    names.insert(key.clone());
                }
            }
        }
        if names.is_empty() {
            return Err(PhishGuardError::Data(
                "documents carry no fields besides the identifier".to_string(),
            ));
        }

        let columns: Vec<Column> = names
            .iter()
            .map(|name| {
                let values: Result<Vec<Option<f64>>> = documents
                    .iter()
                    .map(|doc| self.field_as_f64(doc.get(name.as_str()), name))
                    .collect();
                Ok(Column::new(name.as_str().into(), values?))
            })
            .collect::<Result<Vec<Column>>>()?;

        DataFrame::new(columns).map_err(|e| PhishGuardError::Data(e.to_string()))
    }

    fn field_as_f64(&self, value: Option<&Value>, column: &str) -> Result<Option<f64>> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) => {
                if self.config.missing_tokens.iter().any(|t| t == s) {
                    Ok(None)
                } else {
                    s.parse::<f64>().map(Some).map_err(|_| {
                        PhishGuardError::Data(format!(
                            "non-numeric value '{s}' in column {column}"
                        ))
                    })
                }
            }
            Some(other) => Err(PhishGuardError::Data(format!(
                "unsupported value {other} in column {column}"
            ))),
        }
    }

    /// Seeded shuffle then a single split at the configured test fraction
    fn split(&self, df: &DataFrame) -> Result<(DataFrame, DataFrame)> {
        let n = df.height();
        if n < 2 {
            return Err(PhishGuardError::Data(format!(
                "need at least 2 rows to split, got {n}"
            )));
        }
        let n_test = ((n as f64) * self.config.test_split_ratio).round() as usize;
        let n_test = n_test.clamp(1, n - 1);

        let mut indices: Vec<u32> = (0..n as u32).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_seed);
        indices.shuffle(&mut rng);

        let test_idx = UInt32Chunked::from_vec("idx".into(), indices[..n_test].to_vec());
        let train_idx = UInt32Chunked::from_vec("idx".into(), indices[n_test..].to_vec());

        let test = df.take(&test_idx)?;
        let train = df.take(&train_idx)?;
        Ok((train, test))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingPipelineConfig;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn seeded_store(dir: &TempDir, n: usize) -> DocumentStore {
        let store = DocumentStore::connect(dir.path().join("store").to_str().unwrap()).unwrap();
        let docs: Vec<Document> = (0..n)
            .map(|i| {
                let mut doc = Document::new();
                doc.insert("_id".to_string(), json!(format!("oid{i}")));
                doc.insert("f1".to_string(), json!(i as f64));
                doc.insert(
                    "f2".to_string(),
                    if i % 7 == 3 { json!("na") } else { json!(-(i as f64)) },
                );
                doc.insert("result".to_string(), json!(if i % 2 == 0 { 1 } else { -1 }));
                doc
            })
            .collect();
        store.insert_many("db", "coll", &docs).unwrap();
        store
    }

    fn stage(dir: &TempDir, n: usize) -> DataIngestion {
        let store = seeded_store(dir, n);
        let pipeline =
            TrainingPipelineConfig::with_timestamp(&dir.path().join("artifacts"), "ts");
        let config = DataIngestionConfig::new(&pipeline).with_collection("db", "coll");
        DataIngestion::new(config, store)
    }

    #[test]
    fn test_split_counts_sum_to_source() {
        let dir = TempDir::new().unwrap();
        let ingestion = stage(&dir, 50);
        let artifact = ingestion.run().unwrap();

        let train = crate::data::load_csv(&artifact.trained_file_path).unwrap();
        let test = crate::data::load_csv(&artifact.test_file_path).unwrap();
        assert_eq!(train.height() + test.height(), 50);
        assert_eq!(test.height(), 10); // 0.2 of 50
    }

    #[test]
    fn test_id_column_dropped_and_sentinels_null() {
        let dir = TempDir::new().unwrap();
        let ingestion = stage(&dir, 30);
        ingestion.run().unwrap();

        let feature_store = dir
            .path()
            .join("artifacts/ts/data_ingestion/feature_store/phishing.csv");
        let df = crate::data::load_csv(&feature_store).unwrap();
        assert!(df.column("_id").is_err());
        assert_eq!(df.width(), 3);
        assert!(df.column("f2").unwrap().null_count() > 0);
    }

    #[test]
    fn test_split_is_deterministic() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let a = stage(&dir_a, 40).run().unwrap();
        let b = stage(&dir_b, 40).run().unwrap();

        let train_a = std::fs::read_to_string(&a.trained_file_path).unwrap();
        let train_b = std::fs::read_to_string(&b.trained_file_path).unwrap();
        assert_eq!(train_a, train_b);
    }

    #[test]
    fn test_single_document_collection_fails() {
        let dir = TempDir::new().unwrap();
        let err = stage(&dir, 1).run().unwrap_err();
        assert!(matches!(err, PhishGuardError::Data(_)));
    }

    #[test]
    fn test_empty_collection_fails() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::connect(dir.path().join("store").to_str().unwrap()).unwrap();
        store.insert_many("db", "coll", &[]).unwrap();

        let pipeline = TrainingPipelineConfig::with_timestamp(Path::new("unused"), "ts");
        let config = DataIngestionConfig::new(&pipeline).with_collection("db", "coll");
        let err = DataIngestion::new(config, store).run().unwrap_err();
        assert!(matches!(err, PhishGuardError::Data(_)));
    }
}
