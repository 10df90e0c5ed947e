//! CSV loading and saving shared by the pipeline stages

use crate::error::{PhishGuardError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Load a CSV file with header and schema inference
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .map_err(|e| PhishGuardError::Data(format!("cannot open {}: {e}", path.display())))?;

    let reader = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file);

    reader
        .finish()
        .map_err(|e| PhishGuardError::Data(e.to_string()))
}

/// Write a DataFrame as CSV, creating parent directories
pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)
        .map_err(|e| PhishGuardError::Data(format!("cannot create {}: {e}", path.display())))?;

    CsvWriter::new(&mut file)
        .finish(df)
        .map_err(|e| PhishGuardError::Data(e.to_string()))
}

/// Extract named columns into a row-major `Array2<f64>`; nulls become NaN
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<ndarray::Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let series = df
                .column(col_name)
                .map_err(|_| PhishGuardError::ColumnNotFound(col_name.clone()))?;
            let series_f64 = series
                .cast(&DataType::Float64)
                .map_err(|e| PhishGuardError::Data(e.to_string()))?;
            let values: Vec<f64> = series_f64
                .f64()
                .map_err(|e| PhishGuardError::Data(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(ndarray::Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}

/// Extract one column as `Array1<f64>`; nulls become NaN
pub fn column_to_array1(df: &DataFrame, col_name: &str) -> Result<ndarray::Array1<f64>> {
    let series = df
        .column(col_name)
        .map_err(|_| PhishGuardError::ColumnNotFound(col_name.to_string()))?;
    let series_f64 = series
        .cast(&DataType::Float64)
        .map_err(|e| PhishGuardError::Data(e.to_string()))?;
    let values: Vec<f64> = series_f64
        .f64()
        .map_err(|e| PhishGuardError::Data(e.to_string()))?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    Ok(ndarray::Array1::from_vec(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("t.csv");

        let mut df = DataFrame::new(vec![
            Column::new("a".into(), &[1.0, 2.0, 3.0]),
            Column::new("b".into(), &[4.0, 5.0, 6.0]),
        ])
        .unwrap();

        save_csv(&mut df, &path).unwrap();
        let loaded = load_csv(&path).unwrap();
        assert_eq!(loaded.height(), 3);
        assert_eq!(loaded.width(), 2);
    }

    #[test]
    fn test_columns_to_array2_nulls_become_nan() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), &[Some(1.0), None, Some(3.0)]),
            Column::new("b".into(), &[Some(4.0), Some(5.0), Some(6.0)]),
        ])
        .unwrap();

        let x = columns_to_array2(&df, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(x.dim(), (3, 2));
        assert!(x[[1, 0]].is_nan());
        assert_eq!(x[[2, 1]], 6.0);
    }

    #[test]
    fn test_missing_column() {
        let df = DataFrame::new(vec![Column::new("a".into(), &[1.0])]).unwrap();
        let err = column_to_array1(&df, "missing").unwrap_err();
        assert!(matches!(err, PhishGuardError::ColumnNotFound(_)));
    }
}
