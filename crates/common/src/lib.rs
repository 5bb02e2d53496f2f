// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! shared between the login form controller, its auth collaborators and the page server.
//! This module defines the stored records and the REST wire bodies.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Storage key holding the raw session token
pub const AUTH_TOKEN_KEY: &str = "authToken";
/// Storage key holding the JSON-encoded current user
pub const CURRENT_USER_KEY: &str = "currentUser";
/// Storage key holding the JSON array of login activity records
pub const LOGIN_ACTIVITY_KEY: &str = "loginActivity";

/// Credentials typed into the login form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Fields of the signup form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignupForm {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Chosen password
    pub password: String,
    /// Password typed a second time
    pub confirm_password: String,
    /// Terms and conditions checkbox
    pub agree_terms: bool,
}

/// An authenticated user profile as returned by the auth backend
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Backend identifier (numeric ids are kept as their decimal text)
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Email address
    pub email: String,
    /// Display name, empty when the backend has none
    #[serde(default)]
    pub name: String,
}

/// Locally cached proof of authentication
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque token issued by the backend
    pub token: String,
    /// Profile of the signed-in user
    pub user: User,
}

/// Diagnostic log entry written after each successful login
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginActivityRecord {
    pub email: String,
    pub name: String,
    /// ISO-8601 UTC instant of the login
    pub timestamp: String,
    pub user_agent: String,
    /// Login instant in epoch milliseconds
    pub session_id: String,
}

impl LoginActivityRecord {
    /// Build a record for a login that happened at `at`
    pub fn new(user: &User, at: DateTime<Utc>, user_agent: &str) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            user_agent: user_agent.to_string(),
            session_id: at.timestamp_millis().to_string(),
        }
    }
}

/// Password strength shown by the signup strength bar
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl PasswordStrength {
    /// CSS class name of the strength indicator
    pub fn as_str(self) -> &'static str {
        match self {
            PasswordStrength::Weak => "weak",
            PasswordStrength::Medium => "medium",
            PasswordStrength::Strong => "strong",
            PasswordStrength::VeryStrong => "very-strong",
        }
    }
}

impl fmt::Display for PasswordStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/login`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful response of `POST /api/login`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Body of `POST /api/signup`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Successful response of `POST /api/signup`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignupResponse {
    pub user: User,
}

/// Error body returned by the REST backend on non-2xx responses
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
