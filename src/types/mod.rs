//! Type definitions for the attrition prediction API

pub mod record;
pub mod response;

pub use record::{CanonicalRecord, PredictRequest, ValidationError};
pub use response::{AttritionLabel, PredictionLogView, PredictionResponse};
