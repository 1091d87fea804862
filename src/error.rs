//! Error taxonomy for the API surface.
//!
//! Validation and auth failures are detected before any side effect and
//! carry user-facing detail. Operational failures surface as a generic
//! server error with an opaque correlation id; internals stay in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or forbidden input; user-correctable.
    #[error("{0}")]
    Validation(String),
    /// Missing or mismatched API key.
    #[error("Invalid or missing API key")]
    Unauthorized,
    /// No prediction log stored for the requested id.
    #[error("Aucun log pour employee_id={0}")]
    LogNotFound(i64),
    /// No stored features row for the requested id.
    #[error("Aucune features trouvée pour employee_id='{0}'")]
    FeaturesNotFound(i64),
    /// Operational failure; details are logged under the correlation id.
    #[error("erreur serveur {error_id}")]
    Server { error_id: Uuid },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "detail": detail }),
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "detail": self.to_string() }),
            ),
            ApiError::LogNotFound(_) => {
                (StatusCode::NOT_FOUND, json!({ "detail": self.to_string() }))
            }
            ApiError::FeaturesNotFound(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "detail": self.to_string() }),
            ),
            ApiError::Server { error_id } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "detail": "erreur serveur", "error_id": error_id.to_string() }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ApiError::Validation("bad".to_string()).into_response(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::Unauthorized.into_response(),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::LogNotFound(1).into_response(),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::FeaturesNotFound(1).into_response(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::Server {
                    error_id: Uuid::new_v4(),
                }
                .into_response(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (response, expected) in cases {
            assert_eq!(response.status(), expected);
        }
    }
}
