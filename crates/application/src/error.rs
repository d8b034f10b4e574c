//! Application error types

use cityportal_domain::DomainError;
use thiserror::Error;

use crate::ports::{HttpClientError, StorageError};

/// Application-level errors.
#[derive(Debug, Clone, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The request never completed.
    #[error("network failure: {0}")]
    Network(#[from] HttpClientError),

    /// The server answered with a failure status.
    #[error("{status_code}: {message}")]
    Request {
        /// HTTP status code
        status_code: u16,
        /// Body text, or the status line text when the body was empty
        message: String,
    },

    /// The backend rejected the stored credential.
    #[error("authorization expired")]
    AuthorizationExpired,

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A response body could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The operation completed after a later session change and was discarded.
    #[error("superseded by a later session change")]
    Superseded,
}

impl ApplicationError {
    /// Message suitable for a toast or banner.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Request { message, .. } => message.clone(),
            Self::AuthorizationExpired => {
                "Your session has expired. Please sign in again.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// HTTP status code for `Request` errors.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Request { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
