// ============================
// crates/loginform-lib/src/router.rs
// ============================
//! Page server router.
use std::sync::Arc;

use axum::{handler::HandlerWithoutStateExt, routing::get, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::handlers::{self, health, pages};
use crate::AppState;

/// Create the page server router.
///
/// Fixed entry points and `/health` first, then static files from the public
/// directory, then a JSON 404.
pub fn create_router(state: Arc<AppState>) -> Router {
    let assets = ServeDir::new(&state.settings.public_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(handlers::not_found.into_service());

    Router::new()
        .route("/", get(pages::index))
        .route("/admin", get(pages::admin))
        .route("/dashboard", get(pages::dashboard))
        .route("/health", get(health::health))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
