use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use agegate_pipeline::PipelineError;

/// Errors that can occur when running the Agegate server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A pipeline-level error surfaced through the API.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Map a pipeline error to its HTTP status and optional `Retry-After` seconds.
fn pipeline_status(error: &PipelineError) -> (StatusCode, Option<u64>) {
    match error {
        PipelineError::AlreadyReviewed
        | PipelineError::AlreadyDecided
        | PipelineError::ReviewClaimed { .. } => (StatusCode::CONFLICT, None),
        PipelineError::NothingPending => (StatusCode::NOT_FOUND, None),
        PipelineError::AppealCooldown { retry_after } => {
            (StatusCode::TOO_MANY_REQUESTS, Some(retry_after.as_secs()))
        }
        PipelineError::Guild(_) => (StatusCode::BAD_GATEWAY, None),
        PipelineError::State(_)
        | PipelineError::Record(_)
        | PipelineError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message, retry_after) = match &self {
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), None),
            Self::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None),
            Self::Pipeline(e) => {
                let (status, retry_after) = pipeline_status(e);
                (status, e.to_string(), retry_after)
            }
        };

        let body = if let Some(retry) = retry_after {
            serde_json::json!({ "error": message, "retry_after": retry })
        } else {
            serde_json::json!({ "error": message })
        };

        let mut response = (status, axum::Json(body)).into_response();

        if let Some(retry) = retry_after {
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        response
    }
}
