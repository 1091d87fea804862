//! Classifier artifact loading and inference

pub mod encoding;
pub mod engine;
pub mod loader;

pub use encoding::FeatureEncoding;
pub use engine::{Classifier, ModelError, PredictionEngine, DECISION_THRESHOLD, POSITIVE_CLASS};
pub use loader::ModelLoader;
