//! Classification of request targets as authenticated-backend requests.

use url::Url;

use crate::error::{DomainError, DomainResult};

/// The backend origin plus the allow-list of path prefixes that belong to it.
///
/// Only URLs on the backend origin whose path starts with one of the prefixes
/// are eligible for credential injection and forced logout on 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendScope {
    base: Url,
    prefixes: Vec<String>,
}

impl BackendScope {
    /// Creates a scope for `base` with the given path prefixes.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidUrl`] if `base` cannot be a base URL and
    /// [`DomainError::InvalidPrefix`] if a prefix does not start with `/`.
    pub fn new<I, S>(base: Url, prefixes: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if base.cannot_be_a_base() {
            return Err(DomainError::InvalidUrl(base.to_string()));
        }
        let prefixes = prefixes
            .into_iter()
            .map(Into::into)
            .map(|prefix: String| {
                if prefix.starts_with('/') {
                    Ok(prefix)
                } else {
                    Err(DomainError::InvalidPrefix(prefix))
                }
            })
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(Self { base, prefixes })
    }

    /// Parses `base` and creates a scope.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` is not a valid URL or a prefix is invalid.
    pub fn parse<I, S>(base: &str, prefixes: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let base = Url::parse(base).map_err(|e| DomainError::InvalidUrl(format!("{e}: {base}")))?;
        Self::new(base, prefixes)
    }

    /// Origin of the backend, e.g. `http://localhost:8080`.
    #[must_use]
    pub fn origin(&self) -> String {
        self.base.origin().ascii_serialization()
    }

    /// Resolves a path or absolute URL against the backend base.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidUrl`] if the target cannot be resolved.
    pub fn resolve(&self, target: &str) -> DomainResult<Url> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base
                .join(target)
                .map_err(|e| DomainError::InvalidUrl(format!("{e}: {target}"))),
            Err(e) => Err(DomainError::InvalidUrl(format!("{e}: {target}"))),
        }
    }

    /// Returns true if `url` is an authenticated-backend request.
    #[must_use]
    pub fn contains(&self, url: &Url) -> bool {
        url.origin() == self.base.origin()
            && self
                .prefixes
                .iter()
                .any(|prefix| url.path().starts_with(prefix.as_str()))
    }
}
