//! Fixed HTML entry points.
use std::sync::Arc;

use axum::{extract::State, response::Html};
use tracing::debug;

use crate::error::AppError;
use crate::AppState;

pub const INDEX_PAGE: &str = "index.html";
pub const ADMIN_PAGE: &str = "admin.html";
pub const DASHBOARD_PAGE: &str = "dashboard.html";

/// `GET /`
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    serve_page(&state, INDEX_PAGE).await
}

/// `GET /admin`
pub async fn admin(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    serve_page(&state, ADMIN_PAGE).await
}

/// `GET /dashboard`
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    serve_page(&state, DASHBOARD_PAGE).await
}

async fn serve_page(state: &AppState, page: &str) -> Result<Html<String>, AppError> {
    let path = state.settings.public_dir.join(page);
    debug!(path = %path.display(), "serving page");

    match tokio::fs::read_to_string(&path).await {
        Ok(body) => Ok(Html(body)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound(page.to_string()))
        },
        Err(e) => Err(e.into()),
    }
}
