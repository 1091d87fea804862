//! Request orchestration: validate, normalize, predict, log, respond.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::feature_extractor::{self, FeatureVector};
use crate::metrics::ServiceMetrics;
use crate::models::engine::{Classifier, ModelError};
use crate::store::{Database, StoreError};
use crate::types::record::PredictRequest;
use crate::types::response::{AttritionLabel, PredictionLogView, PredictionResponse};

/// Orchestrates one synchronous classification call.
///
/// The classifier is injected behind its trait so tests (and any future
/// artifact backend) can substitute it without touching the pipeline.
pub struct PredictionService {
    classifier: Arc<dyn Classifier>,
    db: Arc<Database>,
    metrics: Arc<ServiceMetrics>,
}

impl PredictionService {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        db: Arc<Database>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            classifier,
            db,
            metrics,
        }
    }

    /// Handle a client-supplied prediction request.
    pub fn predict(&self, request: PredictRequest) -> Result<PredictionResponse, ApiError> {
        let started = Instant::now();

        let record = request
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let features = feature_extractor::normalize(&record);

        let label = self.label(&features, "/predict")?;
        self.metrics.record_prediction(started.elapsed(), label);

        let latency_ms = started.elapsed().as_millis() as i64;
        let output = json!({ "pred_quitte_entreprise": label.as_str() });
        self.log_prediction(
            "/predict",
            Some(record.id_employee),
            latency_ms,
            &features.to_json(),
            &output,
        );

        Ok(PredictionResponse {
            employee_id: Some(record.id_employee),
            pred_quitte_entreprise: label,
        })
    }

    /// Handle a prediction from stored features.
    pub fn predict_by_id(&self, employee_id: i64) -> Result<PredictionResponse, ApiError> {
        let started = Instant::now();
        let endpoint = format!("/predict/by-id/{employee_id}");

        let row = self
            .db
            .employee_features(employee_id)
            .map_err(|e| self.store_failure(&endpoint, e))?
            .ok_or(ApiError::FeaturesNotFound(employee_id))?;
        let features = feature_extractor::from_stored(&row);

        let label = self.label(&features, &endpoint)?;
        self.metrics.record_prediction(started.elapsed(), label);

        let latency_ms = started.elapsed().as_millis() as i64;
        let payload = json!({ "employee_id": employee_id, "features": features.to_json() });
        let output = json!({ "pred_quitte_entreprise": label.as_str() });
        self.log_prediction(&endpoint, Some(employee_id), latency_ms, &payload, &output);

        Ok(PredictionResponse {
            employee_id: Some(employee_id),
            pred_quitte_entreprise: label,
        })
    }

    /// Latest persisted prediction log for an employee.
    pub fn prediction_log(&self, employee_id: i64) -> Result<PredictionLogView, ApiError> {
        let endpoint = format!("/logs/prediction/{employee_id}");
        let row = self
            .db
            .latest_prediction_log(employee_id)
            .map_err(|e| self.store_failure(&endpoint, e))?
            .ok_or(ApiError::LogNotFound(employee_id))?;

        let pred_quitte_entreprise = row
            .output
            .get("pred_quitte_entreprise")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(PredictionLogView {
            employee_id,
            payload: row.payload,
            pred_quitte_entreprise,
        })
    }

    fn label(&self, features: &FeatureVector, endpoint: &str) -> Result<AttritionLabel, ApiError> {
        match self.classifier.predict_label(features) {
            Ok(label) => Ok(AttritionLabel::from_positive(label)),
            Err(err) => Err(self.prediction_failure(endpoint, &err)),
        }
    }

    /// Record a model failure under a fresh correlation id and surface the
    /// opaque server error. The error-log write itself is best-effort.
    fn prediction_failure(&self, endpoint: &str, err: &ModelError) -> ApiError {
        self.metrics.record_failure();
        self.server_failure(endpoint, model_error_class(err), &err.to_string())
    }

    fn store_failure(&self, endpoint: &str, err: StoreError) -> ApiError {
        self.metrics.record_failure();
        self.server_failure(endpoint, "Store", &err.to_string())
    }

    fn server_failure(&self, endpoint: &str, error_class: &str, message: &str) -> ApiError {
        let error_id = Uuid::new_v4();
        error!(%error_id, endpoint, error_class, error = %message, "request failed");

        let context = json!({ "error_id": error_id.to_string() });
        if let Err(log_err) = self.db.insert_error_log(
            Some(endpoint),
            Some(500),
            Some(error_class),
            Some(message),
            &context,
        ) {
            warn!(error = %log_err, endpoint, "error log write failed");
        }

        ApiError::Server { error_id }
    }

    /// Persist the audit row for a successful prediction. Failures are
    /// logged and deliberately discarded: auditing never blocks the
    /// response the client has already earned.
    fn log_prediction(
        &self,
        endpoint: &str,
        employee_id: Option<i64>,
        latency_ms: i64,
        payload: &Value,
        output: &Value,
    ) {
        match self.db.upsert_prediction_log(
            endpoint,
            None,
            employee_id,
            Some(latency_ms),
            "OK",
            payload,
            output,
        ) {
            Ok(row) => debug!(log_id = row.id, endpoint, "prediction logged"),
            Err(err) => {
                self.metrics.record_log_failure();
                warn!(error = %err, endpoint, "prediction log write failed");
            }
        }
    }
}

fn model_error_class(err: &ModelError) -> &'static str {
    match err {
        ModelError::NotFound(_) => "ModelNotFound",
        ModelError::Encoding(_) => "ModelEncoding",
        ModelError::PositiveClassAbsent => "PositiveClassAbsent",
        ModelError::Runtime(_) => "ModelRuntime",
        ModelError::Poisoned => "ModelLock",
    }
}
