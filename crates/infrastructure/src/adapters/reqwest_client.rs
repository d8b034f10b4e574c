//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! Every response is returned whatever its status; only transport failures
//! become errors.

use std::time::Duration;

use async_trait::async_trait;
use cityportal_application::ports::{HttpClient, HttpClientError};
use cityportal_domain::{HttpMethod, HttpRequest, HttpResponse};
use reqwest::{Client, Method};
use tracing::trace;

use crate::settings::ClientConfig;

/// HTTP client implementation using reqwest.
pub struct ReqwestHttpClient {
    client: Client,
    timeout: Duration,
}

impl ReqwestHttpClient {
    /// Creates a client with the given per-request timeout and user agent.
    ///
    /// Redirects are followed up to 10 hops and TLS verification is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Creates a client from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn from_config(config: &ClientConfig) -> Result<Self, HttpClientError> {
        Self::new(config.timeout(), &config.user_agent)
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Maps reqwest errors to the port's `HttpClientError`.
    fn map_error(&self, error: &reqwest::Error) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout {
                timeout_ms: self.timeout_ms(),
            };
        }
        if error.is_connect() {
            return HttpClientError::ConnectionFailed(error.to_string());
        }
        if error.is_redirect() {
            return HttpClientError::Other(format!("too many redirects: {error}"));
        }
        HttpClientError::Other(error.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpClientError> {
        if !matches!(request.url.scheme(), "http" | "https") {
            return Err(HttpClientError::InvalidUrl(request.url.to_string()));
        }

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), request.url.clone())
            .timeout(self.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| self.map_error(&e))?;
        let status = response.status();
        trace!(status = status.as_u16(), url = %request.url, "response headers received");

        let body = response
            .bytes()
            .await
            .map_err(|e| HttpClientError::Other(format!("failed to read body: {e}")))?
            .to_vec();

        let response = HttpResponse::new(status.as_u16(), body);
        Ok(match status.canonical_reason() {
            Some(reason) => response.with_status_text(reason),
            None => response,
        })
    }
}
