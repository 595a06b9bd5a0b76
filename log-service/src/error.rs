use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reef_core::{DateError, FieldErrorSet};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("missing or invalid x-owner-id header")]
    Unauthorized,

    #[error("invalid date '{0}': {1}")]
    BadDate(String, DateError),

    /// Body the JSON extractor refused: bad syntax, an out-of-range number,
    /// a wrong field type or a missing content type.
    #[error("{1}")]
    BadBody(StatusCode, String),

    #[error("no reading for {0}")]
    NotFound(String),

    #[error("reading rejected")]
    Rejected(FieldErrorSet),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadDate(..) => StatusCode::BAD_REQUEST,
            ApiError::BadBody(status, _) => *status,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            ApiError::Rejected(errors) => {
                serde_json::json!({"error": self.to_string(), "errors": errors})
            }
            ApiError::Internal(e) => {
                error!(error = %e, "request failed");
                serde_json::json!({"error": "internal error"})
            }
            _ => serde_json::json!({"error": self.to_string()}),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadBody(rejection.status(), rejection.body_text())
    }
}
