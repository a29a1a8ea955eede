//! HTTP error handling and response types.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::{Deserialize, Serialize};

use crate::error::PhtError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Request body rejected before reaching the service layer
    Rejected { status: StatusCode, message: String },
    /// Error raised by the service layer
    Service(PhtError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Rejected { status, .. } => *status,
            AppError::Service(e) => match e {
                PhtError::NotFound { .. } => StatusCode::NOT_FOUND,
                PhtError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                PhtError::UpstreamError { .. } => StatusCode::BAD_GATEWAY,
                PhtError::ConfigurationError { .. } | PhtError::InternalError { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Rejected { message, .. } => ApiError::new("INVALID_REQUEST", message),
            AppError::Service(e) => match &e {
                PhtError::NotFound { message, .. } => ApiError::new("NOT_FOUND", message.clone()),
                PhtError::ValidationError { message, context } => {
                    let body = ApiError::new("VALIDATION_ERROR", message.clone());
                    match &context.details {
                        Some(details) => body.with_details(details.clone()),
                        None => body,
                    }
                }
                PhtError::UpstreamError { message, .. } => {
                    error!("Upstream failure: {}", e);
                    ApiError::new("UPSTREAM_ERROR", message.clone())
                }
                PhtError::ConfigurationError { .. } | PhtError::InternalError { .. } => {
                    error!("Internal failure: {}", e);
                    ApiError::new("INTERNAL_ERROR", "Internal server error")
                }
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<PhtError> for AppError {
    fn from(err: PhtError) -> Self {
        AppError::Service(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
