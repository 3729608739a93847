//! Per-request failures and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use druglens_model::ModelError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// `/predict` got a string that does not parse.
    #[error("Invalid SMILES string!")]
    InvalidSmiles,

    #[error("No SMILES input provided!")]
    MissingInput,

    /// `/visualize_3d` could not build a conformer.
    #[error("Invalid SMILES input!")]
    InvalidInput,

    #[error("Inference timed out")]
    Timeout,

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidSmiles => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": self.to_string() }))).into_response()
            }
            ApiError::MissingInput | ApiError::InvalidInput => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            ApiError::Timeout => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": self.to_string() }))).into_response()
            }
            ApiError::Internal(detail) => {
                error!("Request failed: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        ApiError::Internal(format!("model: {e}"))
    }
}

impl From<minijinja::Error> for ApiError {
    fn from(e: minijinja::Error) -> Self {
        ApiError::Internal(format!("template: {e}"))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("worker thread: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::InvalidSmiles.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingInput.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidInput.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Timeout.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ApiError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_content_types() {
        let json = ApiError::InvalidSmiles.into_response();
        assert_eq!(json.headers()[CONTENT_TYPE], "application/json");

        let text = ApiError::MissingInput.into_response();
        assert!(text.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));
    }

    #[test]
    fn test_model_errors_are_internal() {
        let err: ApiError = ModelError::EmptyOutput.into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
