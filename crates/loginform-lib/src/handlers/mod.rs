// crates/loginform-lib/src/handlers/mod.rs

//! HTTP handlers of the page server.

pub mod health;
pub mod pages;

use axum::http::Uri;

use crate::error::AppError;

/// Fallback for every unmatched route
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
