// ============================
// loginform-lib/src/lib.rs
// ============================
//! Login/signup form controller and the page server that hosts it.

pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod handlers;
pub mod router;
pub mod session;
pub mod store;
pub mod ui;
pub mod validation;

use std::sync::Arc;

use crate::config::Settings;

pub use crate::controller::FormController;
pub use crate::error::{AppError, AuthError, FormError};

/// Application state shared across all page server handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Settings the server was started with
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}
