// crates/loginform-lib/src/error.rs

//! Error taxonomy + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub use crate::validation::ValidationError;

/// User-facing message shown for transport failures
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

/// Failures reported by, or while talking to, an auth collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The backend answered and refused the request
    #[error("Authentication rejected (status {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered 2xx with a body we could not decode
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AuthError::InvalidResponse(err.to_string())
        } else {
            AuthError::Network(err.to_string())
        }
    }
}

/// Failure of a form submission, recovered at the submission boundary
#[derive(Error, Debug)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] AppError),

    #[error("A submission is already in progress")]
    InFlight,
}

impl FormError {
    /// The single transient message shown for this failure.
    ///
    /// `fallback` is used when the collaborator rejected the request without
    /// a message of its own.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            FormError::Validation(e) => e.to_string(),
            FormError::Auth(AuthError::Rejected { message, .. }) => message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(fallback)
                .to_string(),
            FormError::Auth(AuthError::Network(_) | AuthError::InvalidResponse(_)) => {
                NETWORK_ERROR_MESSAGE.to_string()
            },
            FormError::Storage(_) => fallback.to_string(),
            FormError::InFlight => String::new(),
        }
    }
}

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NF_001",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
            AppError::InvalidKey(_) => "VAL_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::NotFound(_) => "Route not found".to_string(),
            AppError::InvalidKey(_) => "Invalid input provided".to_string(),
            AppError::Io(_) | AppError::Json(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }

        let body = serde_json::json!({
            "message": self.sanitized_message(),
        });

        (status, axum::Json(body)).into_response()
    }
}
