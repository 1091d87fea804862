//! Attrition Prediction Service Library
//!
//! Serves an employee attrition-risk classifier over HTTP, backed by a
//! SQLite store for feature lookup and prediction audit logging.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod server;
pub mod service;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use feature_extractor::{FeatureVector, EXPECTED_COLS};
pub use metrics::ServiceMetrics;
pub use models::{Classifier, ModelLoader, PredictionEngine};
pub use service::PredictionService;
pub use store::Database;
pub use types::{CanonicalRecord, PredictRequest, PredictionResponse};
