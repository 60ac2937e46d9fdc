//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Boxed failure returned by command implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures while loading, resolving or validating endpoint specs.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("spec resource not found: {0}")]
    NotFound(String),
    #[error("error in JSON: {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid spec: {0}")]
    Invalid(String),
    #[error("spec load: {0}")]
    Load(String),
}

/// Per-request failures surfaced to the transport layer.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("Only one command is allowed")]
    TooManyCommands,
    #[error("no such command {0}")]
    UnknownCommand(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("bad request: {0}")]
    Wrapped(#[source] BoxError),
}

impl ApiError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ApiError::Spec(_) | ApiError::Server(_))
    }

    /// Classify a command failure: an `ApiError` keeps its kind, anything else
    /// becomes a generic client error.
    pub fn from_command(err: BoxError) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api) => *api,
            Err(other) => ApiError::Wrapped(other),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Spec(_) => (StatusCode::INTERNAL_SERVER_ERROR, "spec_error"),
            ApiError::Server(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::TooManyCommands => (StatusCode::BAD_REQUEST, "too_many_commands"),
            ApiError::UnknownCommand(_) => (StatusCode::BAD_REQUEST, "unknown_command"),
            ApiError::BadRequest(_) | ApiError::Wrapped(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
