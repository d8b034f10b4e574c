//! Wire payloads for the requests the portal writes.
//!
//! Field names here are the backend's wire contract.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::credential::DEFAULT_TOKEN_SCHEME;

/// Body of `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    /// Login handle
    pub username: String,
    /// Plain-text password
    pub password: String,
}

impl LoginRequest {
    /// Creates a login request.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Response of `POST /auth/login` (the JWT response).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Issued access token
    pub token: String,
    /// Token scheme, e.g. `Bearer`
    #[serde(rename = "type", default = "default_token_type")]
    pub token_type: String,
    /// Subject id
    pub id: i64,
    /// Login handle
    pub username: String,
    /// Email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Raw role strings, e.g. `ROLE_USER`
    #[serde(default)]
    pub roles: Vec<String>,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_SCHEME.to_string()
}

/// Body of `POST /auth/register`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    /// Login handle
    pub username: String,
    /// Email address
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Display name
    pub name: String,
    /// Requested roles; omitted from the body when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

impl RegisterRequest {
    /// Creates a registration request without explicit roles.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            name: name.into(),
            roles: None,
        }
    }

    /// Requests specific roles for the new account.
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = Some(roles);
        self
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /api/scrapbook`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScrapbookEntry {
    /// Title, at most 100 characters
    pub title: String,
    /// Body text
    pub content: String,
    /// Attached image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Share with every visitor
    pub is_public: bool,
    /// Where the memory was made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl NewScrapbookEntry {
    /// Creates a private entry.
    #[must_use]
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image_url: None,
            is_public: false,
            location: None,
        }
    }
}
