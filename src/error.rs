use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::llm::LlmError;

/// Failures surfaced to HTTP callers. Every collaborator problem collapses
/// into `Upstream`; the context names the operation that failed.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Clone '{0}' not found")]
    CloneNotFound(String),
    #[error("{context}: {source}")]
    Upstream {
        context: &'static str,
        #[source]
        source: LlmError,
    },
}

impl ServiceError {
    pub fn upstream(context: &'static str) -> impl FnOnce(LlmError) -> Self {
        move |source| ServiceError::Upstream { context, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::CloneNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}
