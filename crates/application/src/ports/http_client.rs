//! HTTP Client port

use async_trait::async_trait;
use cityportal_domain::{HttpRequest, HttpResponse};

/// Transport-level failures: the request never produced a response.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpClientError {
    /// The request exceeded its timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout
        timeout_ms: u64,
    },

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The URL was rejected by the transport.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Any other transport error.
    #[error("{0}")]
    Other(String),
}

/// Port for executing HTTP requests.
///
/// Implementations return every response the server produced, whatever its
/// status; only transport failures are errors.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Executes an HTTP request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received.
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpClientError>;
}
