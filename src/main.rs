//! PhishGuard - training pipeline entry point

use anyhow::Context;
use clap::Parser;
use phishguard::config::{DataIngestionConfig, DataValidationConfig, TrainingPipelineConfig};
use phishguard::pipeline::TrainingPipeline;
use phishguard::store::{DocumentStore, STORE_URL_ENV};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "phishguard", about = "Train a phishing URL classifier")]
struct Args {
    /// Document store database to ingest from
    #[arg(long, default_value = "phishguard")]
    database: String,

    /// Document store collection to ingest from
    #[arg(long, default_value = "phishing_data")]
    collection: String,

    /// Expected-column schema definition
    #[arg(long, default_value = "schema.yaml")]
    schema: PathBuf,

    /// Store connection string; falls back to PHISHGUARD_STORE_URL
    #[arg(long)]
    store_url: Option<String>,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
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

    let config = TrainingPipelineConfig::new();
    let ingestion =
        DataIngestionConfig::new(&config).with_collection(&args.database, &args.collection);
    let validation = DataValidationConfig::new(&config).with_schema_path(&args.schema);

    let artifact = TrainingPipeline::new(config, store)
        .with_ingestion_config(ingestion)
        .with_validation_config(validation)
        .run()?;

    println!("{artifact}");
    println!(
        "train: acc={:.4} f1={:.4}  test: acc={:.4} f1={:.4}",
        artifact.train_metrics.accuracy,
        artifact.train_metrics.f1_score,
        artifact.test_metrics.accuracy,
        artifact.test_metrics.f1_score
    );
    Ok(())
}
