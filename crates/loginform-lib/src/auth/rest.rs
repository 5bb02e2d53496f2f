//! Collaborator for a custom REST API (`POST /api/login`, `POST /api/signup`).
use async_trait::async_trait;
use loginform_common::{
    LoginRequest, LoginResponse, Session, SignupRequest, SignupResponse, User,
};
use reqwest::Url;
use tracing::debug;

use super::{base_url, read_json, rest_message, AuthClient};
use crate::error::AuthError;

/// Talks JSON to `{base_url}/api/login` and `{base_url}/api/signup`
#[derive(Debug, Clone)]
pub struct RestAuthClient {
    http: reqwest::Client,
    login_url: Url,
    signup_url: Url,
}

impl RestAuthClient {
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let base = base_url(base)?;
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            login_url: base.join("api/login")?,
            signup_url: base.join("api/signup")?,
        })
    }
}

#[async_trait]
impl AuthClient for RestAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        debug!(url = %self.login_url, "signing in");
        let response = self
            .http
            .post(self.login_url.clone())
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let body: LoginResponse = read_json(response, rest_message).await?;
        Ok(Session {
            token: body.token,
            user: body.user,
        })
    }

    async fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        debug!(url = %self.signup_url, "signing up");
        let response = self
            .http
            .post(self.signup_url.clone())
            .json(&SignupRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let body: SignupResponse = read_json(response, rest_message).await?;
        Ok(body.user)
    }
}
