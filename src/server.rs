//! HTTP surface: routing, authentication, and error mapping.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::service::PredictionService;
use crate::types::record::PredictRequest;
use crate::types::response::{PredictionLogView, PredictionResponse};

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub api_key: String,
    pub start_time: Instant,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/predict", post(predict_handler))
        .route("/predict/by-id/{employee_id}", get(predict_by_id_handler))
        .route("/logs/prediction/{employee_id}", get(prediction_log_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let api = protected.route("/health", get(health_handler));

    Router::new()
        .route("/", get(root_handler))
        .nest("/api/v1", api)
        .with_state(state)
}

/// Shared-secret check applied before any side effect on the prediction
/// and log routes. An empty configured key disables the check.
async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.api_key.is_empty() {
        let provided = request
            .headers()
            .get("x-api-key")
            .and_then(|v| v.to_str().ok());
        if provided != Some(state.api_key.as_str()) {
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}

/// POST /api/v1/predict
async fn predict_handler(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictionResponse>, ApiError> {
    state.service.predict(request).map(Json)
}

/// GET /api/v1/predict/by-id/{employee_id}
async fn predict_by_id_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<i64>,
) -> Result<Json<PredictionResponse>, ApiError> {
    state.service.predict_by_id(employee_id).map(Json)
}

/// GET /api/v1/logs/prediction/{employee_id}
async fn prediction_log_handler(
    State(state): State<AppState>,
    Path(employee_id): Path<i64>,
) -> Result<Json<PredictionLogView>, ApiError> {
    state.service.prediction_log(employee_id).map(Json)
}

/// GET /api/v1/health - liveness probe, no auth
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET / - service banner
async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Attrition prediction API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Bind and serve until shutdown.
pub async fn run(config: &AppConfig, service: Arc<PredictionService>) -> anyhow::Result<()> {
    let state = AppState {
        service,
        api_key: config.server.api_key.clone(),
        start_time: Instant::now(),
    };
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "HTTP server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::FeatureVector;
    use crate::metrics::ServiceMetrics;
    use crate::models::engine::{Classifier, ModelError, DECISION_THRESHOLD};
    use crate::store::employees::{insert_fixture, EmployeeFeatures};
    use crate::store::Database;
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const TEST_KEY: &str = "test-key";

    struct StubClassifier {
        proba: f64,
    }

    impl Classifier for StubClassifier {
        fn predict_proba(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
            Ok(self.proba)
        }
    }

    fn test_app() -> (Router, Arc<Database>) {
        let db = Arc::new(Database::in_memory().unwrap());
        let service = Arc::new(PredictionService::new(
            Arc::new(StubClassifier {
                proba: DECISION_THRESHOLD,
            }),
            db.clone(),
            Arc::new(ServiceMetrics::new()),
        ));
        let state = AppState {
            service,
            api_key: TEST_KEY.to_string(),
            start_time: Instant::now(),
        };
        (router(state), db)
    }

    fn post_predict(body: Value, api_key: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder()
            .method("POST")
            .uri("/api/v1/predict")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = api_key {
            builder = builder.header("x-api-key", key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_predict_success_minimal_payload() {
        let (app, _db) = test_app();
        let response = app
            .oneshot(post_predict(
                json!({"id_employee": 1, "age": 30}),
                Some(TEST_KEY),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(matches!(
            body["pred_quitte_entreprise"].as_str(),
            Some("OUI") | Some("NON")
        ));
        assert_eq!(body["employee_id"], 1);
    }

    #[tokio::test]
    async fn test_predict_missing_api_key_returns_401() {
        let (app, _db) = test_app();
        let response = app
            .oneshot(post_predict(json!({"id_employee": 1, "age": 30}), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_predict_wrong_api_key_returns_401() {
        let (app, _db) = test_app();
        let response = app
            .oneshot(post_predict(
                json!({"id_employee": 1, "age": 30}),
                Some("wrong-key"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_predict_rejects_unknown_field() {
        let (app, _db) = test_app();
        let response = app
            .oneshot(post_predict(
                json!({"id_employee": 1, "age": 30, "revenu_mensuel": 2500}),
                Some(TEST_KEY),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_predict_rejects_negative_numeric() {
        let (app, _db) = test_app();
        let response = app
            .oneshot(post_predict(
                json!({"id_employee": 1, "age": -1}),
                Some(TEST_KEY),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_predict_rejects_missing_id_employee() {
        let (app, _db) = test_app();
        let response = app
            .oneshot(post_predict(json!({}), Some(TEST_KEY)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_predict_accepts_yes_no_variants() {
        let (app, _db) = test_app();
        let response = app
            .oneshot(post_predict(
                json!({"id_employee": 1, "age": 30, "heure_supplementaires": "yes"}),
                Some(TEST_KEY),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_predict_rejects_invalid_heure_supplementaires() {
        let (app, _db) = test_app();
        let response = app
            .oneshot(post_predict(
                json!({"id_employee": 1, "heure_supplementaires": "maybe"}),
                Some(TEST_KEY),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_predict_by_id_missing_row_returns_422() {
        let (app, _db) = test_app();
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/v1/predict/by-id/999999")
                    .header("x-api-key", TEST_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_predict_by_id_with_stored_row() {
        let (app, db) = test_app();
        let mut row = EmployeeFeatures::empty(7);
        row.age = Some(29.0);
        row.genre = Some("FEMME".to_string());
        insert_fixture(&db, &row);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/v1/predict/by-id/7")
                    .header("x-api-key", TEST_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["employee_id"], 7);
    }

    #[tokio::test]
    async fn test_prediction_log_roundtrip() {
        let (app, _db) = test_app();

        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/v1/logs/prediction/1")
                    .header("x-api-key", TEST_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(post_predict(
                json!({"id_employee": 1, "age": 30}),
                Some(TEST_KEY),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/v1/logs/prediction/1")
                    .header("x-api-key", TEST_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["employee_id"], 1);
        assert!(matches!(
            body["pred_quitte_entreprise"].as_str(),
            Some("OUI") | Some("NON")
        ));
    }

    #[tokio::test]
    async fn test_health_requires_no_auth() {
        let (app, _db) = test_app();
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }
}
