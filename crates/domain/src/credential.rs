//! Credential records and role normalization.
//!
//! A [`CredentialRecord`] is the normalized bundle the client keeps after a
//! successful login: the access token (always paired with its scheme) and the
//! identity of the signed-in user with a single [`Role`] label.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::payload::LoginResponse;

/// Role string the backend uses to mark administrators.
pub const ADMIN_ROLE_MARKER: &str = "ROLE_ADMIN";

/// Scheme assumed when a token was persisted without one.
pub const DEFAULT_TOKEN_SCHEME: &str = "Bearer";

/// Normalized role of a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular portal user
    #[default]
    User,
    /// Portal administrator
    Admin,
}

impl Role {
    /// Collapses the backend's list of role strings into a single label.
    ///
    /// The presence of [`ADMIN_ROLE_MARKER`] anywhere in the list yields
    /// [`Role::Admin`]; everything else, including an empty list, is
    /// [`Role::User`].
    #[must_use]
    pub fn from_role_strings<S: AsRef<str>>(roles: &[S]) -> Self {
        if roles.iter().any(|role| role.as_ref() == ADMIN_ROLE_MARKER) {
            Self::Admin
        } else {
            Self::User
        }
    }

    /// Returns the label as persisted in `user_data`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Returns true for [`Role::Admin`].
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

/// Identity of the signed-in user.
///
/// This is exactly the JSON object persisted under the `user_data` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend subject id
    pub id: i64,
    /// Login handle
    pub username: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Normalized role
    pub role: Role,
}

/// An access token together with its scheme.
///
/// Token and scheme only exist as a pair, so a credential can never be
/// half-present.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    scheme: String,
}

impl AccessToken {
    /// Creates a token, rejecting empty values or schemes.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyToken`] or [`DomainError::EmptyScheme`].
    pub fn new(value: impl Into<String>, scheme: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        let scheme = scheme.into();
        if value.trim().is_empty() {
            return Err(DomainError::EmptyToken);
        }
        if scheme.trim().is_empty() {
            return Err(DomainError::EmptyScheme);
        }
        Ok(Self { value, scheme })
    }

    /// Creates a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyToken`] if `value` is empty.
    pub fn bearer(value: impl Into<String>) -> DomainResult<Self> {
        Self::new(value, DEFAULT_TOKEN_SCHEME)
    }

    /// The opaque token value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The token scheme, e.g. `Bearer`.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Formats the `Authorization` header value: `"<scheme> <token>"`.
    #[must_use]
    pub fn authorization_header_value(&self) -> String {
        format!("{} {}", self.scheme, self.value)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("scheme", &self.scheme)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Normalized identity plus token bundle persisted client-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Token and scheme
    pub token: AccessToken,
    /// The signed-in user
    pub user: UserProfile,
}

impl CredentialRecord {
    /// Creates a record from its parts.
    #[must_use]
    pub const fn new(token: AccessToken, user: UserProfile) -> Self {
        Self { token, user }
    }

    /// Normalizes a raw login response into a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the response carries an empty token or scheme.
    pub fn from_login_response(response: LoginResponse) -> DomainResult<Self> {
        let role = Role::from_role_strings(&response.roles);
        let token = AccessToken::new(response.token, response.token_type)?;
        Ok(Self {
            token,
            user: UserProfile {
                id: response.id,
                username: response.username,
                name: response.name,
                email: response.email,
                role,
            },
        })
    }

    /// The normalized role of the user.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.user.role
    }

    /// Formats the `Authorization` header value for this credential.
    #[must_use]
    pub fn authorization_header_value(&self) -> String {
        self.token.authorization_header_value()
    }
}
