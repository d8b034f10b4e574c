//! Fully-resolved outgoing request handed to the HTTP transport.

use std::fmt;

use url::Url;

use super::HttpMethod;

/// `Authorization` header name.
pub const AUTHORIZATION: &str = "Authorization";
/// `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";
/// Content type for JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// An HTTP request with an absolute URL.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method
    pub method: HttpMethod,
    /// Absolute target URL
    pub url: Url,
    /// Header pairs; names are unique ignoring ASCII case
    pub headers: Vec<(String, String)>,
    /// Serialized body, if any
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub const fn new(method: HttpMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Sets a header, replacing any existing header of the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Attaches a JSON body and its content type.
    #[must_use]
    pub fn with_json_body(mut self, body: Vec<u8>) -> Self {
        self.set_header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        self.body = Some(body);
        self
    }

    /// Sets a header in place, replacing any existing header of the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Looks up a header value ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(n, v)| {
                if n.eq_ignore_ascii_case(AUTHORIZATION) {
                    (n.as_str(), "<redacted>")
                } else {
                    (n.as_str(), v.as_str())
                }
            })
            .collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &headers)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> HttpRequest {
        HttpRequest::new(
            HttpMethod::Get,
            Url::parse("http://localhost:8080/api/user").unwrap(),
        )
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let req = request()
            .with_header("authorization", "Bearer old")
            .with_header(AUTHORIZATION, "Bearer new");
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("AUTHORIZATION"), Some("Bearer new"));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let req = request().with_json_body(b"{}".to_vec());
        assert_eq!(req.header("content-type"), Some(JSON_CONTENT_TYPE));
        assert_eq!(req.body.as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn test_debug_redacts_authorization() {
        let req = request().with_header(AUTHORIZATION, "Bearer abc");
        let debug = format!("{req:?}");
        assert!(!debug.contains("Bearer abc"));
    }
}
