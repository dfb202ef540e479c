//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pipeline::PipelineError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request from the client, e.g. a malformed path id.
    #[error("{0}")]
    BadRequest(String),

    /// Failure surfaced by the request pipeline.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// Returns the HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(err) => match err {
                PipelineError::NotFound { .. } => StatusCode::NOT_FOUND,
                PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
                PipelineError::Cancelled => StatusCode::REQUEST_TIMEOUT,
                PipelineError::Unhandled { .. } | PipelineError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        metrics::counter!("api_errors_total", "status" => status.as_str().to_string())
            .increment(1);

        let body = match &self {
            ApiError::Pipeline(PipelineError::Validation(failures)) => {
                serde_json::json!({ "errors": failures })
            }
            ApiError::Pipeline(PipelineError::Unhandled { correlation_id, .. }) => {
                serde_json::json!({
                    "error": self.to_string(),
                    "correlation_id": correlation_id.to_string(),
                })
            }
            ApiError::Pipeline(PipelineError::Internal(source)) => {
                // The mediator reduces these; reaching here means a bypass.
                tracing::error!(error = %source, "internal server error");
                serde_json::json!({ "error": "Internal server error" })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        (status, axum::Json(body)).into_response()
    }
}
