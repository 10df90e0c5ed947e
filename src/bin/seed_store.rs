//! Bulk-load a CSV file into the document store
//!
//! Counterpart of the training pipeline's ingestion stage: reads a raw
//! phishing dataset and appends one document per row to the configured
//! collection.

use anyhow::Context;
use clap::Parser;
use phishguard::data::load_csv;
use phishguard::store::{Document, DocumentStore, STORE_URL_ENV};
use polars::prelude::*;
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "seed_store", about = "Load a CSV dataset into the document store")]
struct Args {
    /// CSV file to load
    csv: PathBuf,

    /// Target database
    #[arg(long, default_value = "phishguard")]
    database: String,

    /// Target collection
    #[arg(long, default_value = "phishing_data")]
    collection: String,

    /// Store connection string; falls back to PHISHGUARD_STORE_URL
    #[arg(long)]
    store_url: Option<String>,
}

fn documents_from_frame(df: &DataFrame) -> anyhow::Result<Vec<Document>> {
    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();

    let mut columns = Vec::with_capacity(names.len());
    for name in &names {
        let series = df.column(name)?.cast(&DataType::Float64)?;
        let values: Vec<Option<f64>> = series.f64()?.into_iter().collect();
        columns.push(values);
    }

    let docs = (0..df.height())
        .map(|row| {
            let mut doc = Document::new();
            doc.insert("_id".to_string(), json!(row));
            for (name, values) in names.iter().zip(columns.iter()) {
                let value = match values[row] {
                    Some(v) => json!(v),
                    None => Value::Null,
                };
                doc.insert(name.clone(), value);
            }
            doc
        })
        .collect();
    Ok(docs)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "phishguard=info".into()),
        )
        .init();

    let args = Args::parse();
    let url = args
        .store_url
        .or_else(|| std::env::var(STORE_URL_ENV).ok())
        .with_context(|| format!("no store URL given and {STORE_URL_ENV} is not set"))?;
    let store = DocumentStore::connect(&url)?;

    let df = load_csv(&args.csv)?;
    let docs = documents_from_frame(&df)?;
    let written = store.insert_many(&args.database, &args.collection, &docs)?;

    println!(
        "loaded {} rows x {} columns from {} into {}/{} ({written} documents written)",
        df.height(),
        df.width(),
        args.csv.display(),
        args.database,
        args.collection
    );
    Ok(())
}
