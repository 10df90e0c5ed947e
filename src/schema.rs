//! Expected-column schema for ingested tables
//!
//! The schema is defined externally in a YAML file: a fixed column list with
//! expected types plus the target column name. Validation only enforces the
//! column count and target presence; the type tags document the contract.

use crate::error::{PhishGuardError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Declared type of a schema column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Float,
}

/// One expected column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

/// Full schema definition for the phishing table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSchema {
    pub columns: Vec<ColumnSpec>,
    pub target_column: String,
}

impl DataSchema {
    /// Load a schema from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PhishGuardError::Schema(format!("cannot read schema {}: {e}", path.display()))
        })?;
        let schema: Self = serde_yaml::from_str(&text)?;
        if schema.columns.is_empty() {
            return Err(PhishGuardError::Schema("schema has no columns".to_string()));
        }
        if !schema.columns.iter().any(|c| c.name == schema.target_column) {
            return Err(PhishGuardError::Schema(format!(
                "target column '{}' missing from schema columns",
                schema.target_column
            )));
        }
        Ok(schema)
    }

    /// Write the schema as YAML
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_yaml::to_string(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Number of expected columns (features + target)
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Build a schema from column names, all typed as integers
    pub fn from_columns(names: &[String], target_column: &str) -> Self {
        Self {
            columns: names
                .iter()
                .map(|name| ColumnSpec {
                    name: name.clone(),
                    column_type: ColumnType::Int,
                })
                .collect(),
            target_column: target_column.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_schema() -> DataSchema {
        DataSchema::from_columns(
            &[
                "having_ip_address".to_string(),
                "url_length".to_string(),
                "result".to_string(),
            ],
            "result",
        )
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.yaml");

        let schema = sample_schema();
        schema.save(&path).unwrap();

        let loaded = DataSchema::load(&path).unwrap();
        assert_eq!(loaded.n_columns(), 3);
        assert_eq!(loaded.target_column, "result");
        assert_eq!(loaded.columns[1].name, "url_length");
    }

    #[test]
    fn test_load_rejects_missing_target() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(
            &path,
            "columns:\n  - name: a\n    type: int\ntarget_column: result\n",
        )
        .unwrap();

        let err = DataSchema::load(&path).unwrap_err();
        assert!(matches!(err, PhishGuardError::Schema(_)));
    }

    #[test]
    fn test_load_missing_file_is_schema_error() {
        let err = DataSchema::load(Path::new("/nonexistent/schema.yaml")).unwrap_err();
        assert!(matches!(err, PhishGuardError::Schema(_)));
    }
}
