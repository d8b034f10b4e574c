//! Domain error types

use thiserror::Error;

/// Domain-level errors raised while constructing or parsing values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An access token was empty.
    #[error("access token must not be empty")]
    EmptyToken,

    /// A token scheme was empty.
    #[error("token scheme must not be empty")]
    EmptyScheme,

    /// A role label is not one of `user` or `admin`.
    #[error("unknown role label: {0}")]
    UnknownRole(String),

    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A backend path prefix does not start with `/`.
    #[error("invalid backend prefix: {0}")]
    InvalidPrefix(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
