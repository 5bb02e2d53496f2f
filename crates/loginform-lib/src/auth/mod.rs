// ============================
// crates/loginform-lib/src/auth/mod.rs
// ============================
//! Auth collaborators.
//!
//! The controller only sees [`AuthClient`]; which backend sits behind it is a
//! configuration choice.

mod managed;
mod rest;

use std::sync::Arc;

use async_trait::async_trait;
use loginform_common::{ErrorBody, Session, User};
use serde::de::DeserializeOwned;

pub use managed::ManagedAuthClient;
pub use rest::RestAuthClient;

use crate::config::AuthBackend;
use crate::error::AuthError;

/// External service performing credential verification and account creation
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Verify credentials and obtain a session
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Create an account; the user still has to sign in afterwards
    async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError>;
}

/// Build the collaborator selected in the settings
pub fn build_auth_client(backend: &AuthBackend) -> anyhow::Result<Arc<dyn AuthClient>> {
    Ok(match backend {
        AuthBackend::Rest { base_url } => Arc::new(RestAuthClient::new(base_url)?),
        AuthBackend::Managed {
            project_url,
            api_key,
        } => Arc::new(ManagedAuthClient::new(project_url, api_key)?),
    })
}

/// Parse a base URL so that relative joins append to its path
fn base_url(raw: &str) -> anyhow::Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Decode a 2xx body, or turn anything else into [`AuthError::Rejected`]
async fn read_json<T, E>(
    response: reqwest::Response,
    message_of: impl FnOnce(E) -> Option<String>,
) -> Result<T, AuthError>
where
    T: DeserializeOwned,
    E: DeserializeOwned,
{
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        return serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()));
    }

    let message = serde_json::from_slice::<E>(&bytes).ok().and_then(message_of);
    Err(AuthError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn rest_message(body: ErrorBody) -> Option<String> {
    body.message
}
