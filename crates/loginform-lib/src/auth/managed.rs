//! Collaborator for a managed email/password auth service.
//!
//! Speaks the GoTrue dialect: `/auth/v1/token?grant_type=password` to sign in
//! and `/auth/v1/signup` to register, authorised with the project's public
//! API key.
use async_trait::async_trait;
use loginform_common::{Session, User};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{base_url, read_json, AuthClient};
use crate::error::AuthError;

/// Client for a managed auth project
#[derive(Debug, Clone)]
pub struct ManagedAuthClient {
    http: reqwest::Client,
    api_key: String,
    token_url: Url,
    signup_url: Url,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: ManagedUser,
}

#[derive(Deserialize)]
struct ManagedUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Deserialize, Default)]
struct UserMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
}

/// Signup answers with the bare user, or wrapped next to a session when
/// email confirmation is disabled
#[derive(Deserialize)]
#[serde(untagged)]
enum SignupResponse {
    Wrapped { user: ManagedUser },
    Bare(ManagedUser),
}

#[derive(Deserialize, Default)]
struct ManagedErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn managed_message(body: ManagedErrorBody) -> Option<String> {
    body.error_description.or(body.msg).or(body.message)
}

impl ManagedUser {
    fn into_user(self, fallback_email: &str) -> User {
        let UserMetadata { name, full_name } = self.user_metadata;
        User {
            id: self.id,
            email: self.email.unwrap_or_else(|| fallback_email.to_string()),
            name: name.or(full_name).unwrap_or_default(),
        }
    }
}

impl ManagedAuthClient {
    pub fn new(project_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let base = base_url(project_url)?;
        let mut token_url = base.join("auth/v1/token")?;
        token_url.set_query(Some("grant_type=password"));

        Ok(Self {
            http: reqwest::Client::builder().build()?,
            api_key: api_key.to_string(),
            token_url,
            signup_url: base.join("auth/v1/signup")?,
        })
    }

    fn post(&self, url: &Url) -> reqwest::RequestBuilder {
        self.http
            .post(url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl AuthClient for ManagedAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        debug!(url = %self.token_url, "signing in with managed auth");
        let response = self
            .post(&self.token_url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let body: TokenResponse = read_json(response, managed_message).await?;
        Ok(Session {
            token: body.access_token,
            user: body.user.into_user(email),
        })
    }

    async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        debug!(url = %self.signup_url, "signing up with managed auth");
        let response = self
            .post(&self.signup_url)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }))
            .send()
            .await?;

        let user = match read_json(response, managed_message).await? {
            SignupResponse::Wrapped { user } | SignupResponse::Bare(user) => user,
        };
        Ok(user.into_user(email))
    }
}
