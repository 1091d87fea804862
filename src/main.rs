//! Attrition Prediction Service - Main Entry Point
//!
//! Boots the SQLite store, the ONNX classifier and the HTTP API.

use anyhow::Result;
use attrition_service::{
    config::AppConfig,
    metrics::{MetricsReporter, ServiceMetrics},
    models::{ModelLoader, PredictionEngine},
    server,
    service::PredictionService,
    store::Database,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("attrition_service=info".parse()?),
        )
        .init();

    info!("Starting attrition prediction service");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    // Open the database and bootstrap the schema
    let db = Arc::new(Database::open(&config.database.path)?);
    info!(path = %config.database.path, "Database ready");

    // Initialize the prediction engine; a missing artifact is tolerated at
    // startup and retried lazily on the first prediction.
    let loader = ModelLoader::new(&config.model.model_path, &config.model.encoding_path)
        .with_threads(config.model.intra_threads);
    let engine = Arc::new(PredictionEngine::new(loader));
    match engine.load_eager() {
        Ok(()) => info!("Classifier artifact loaded"),
        Err(err) => warn!(
            error = %err,
            "Classifier not loaded at startup; will load on first prediction"
        ),
    }

    // Initialize metrics and the periodic reporter
    let metrics = Arc::new(ServiceMetrics::new());
    let reporter_metrics = metrics.clone();
    tokio::spawn(async move {
        MetricsReporter::new(reporter_metrics, 60).start().await;
    });

    let service = Arc::new(PredictionService::new(engine, db, metrics));

    server::run(&config, service).await
}
