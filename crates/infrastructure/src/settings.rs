//! Client configuration.
//!
//! Layers, lowest priority first: built-in defaults, an optional TOML file
//! (`cityportal.toml` in the working directory unless a path is given) and
//! `CITYPORTAL_*` environment variables. `CITYPORTAL_BACKEND_PREFIXES` takes a
//! comma-separated list.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cityportal_domain::BackendScope;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_PREFIX: &str = "CITYPORTAL";
const DEFAULT_FILE_STEM: &str = "cityportal";
const DEFAULT_PREFIXES: [&str; 2] = ["/api/", "/auth/"];

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A source could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was read but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for the session client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL
    pub base_url: String,
    /// Path prefixes that belong to the authenticated backend
    pub backend_prefixes: Vec<String>,
    /// Directory for the session file; the platform data dir when unset
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            backend_prefixes: DEFAULT_PREFIXES.iter().map(ToString::to_string).collect(),
            storage_dir: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from defaults, the optional file and the
    /// environment.
    ///
    /// An explicitly given `file` must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or a value is invalid.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(file, None)
    }

    /// Like [`ClientConfig::load`], reading variables from `env` instead of
    /// the process environment when given.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or a value is invalid.
    pub fn load_with_env(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("base_url", defaults.base_url)?
            .set_default("backend_prefixes", defaults.backend_prefixes)?
            .set_default("timeout_secs", defaults.timeout_secs)?
            .set_default("user_agent", defaults.user_agent)?;

        builder = match file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_FILE_STEM).required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("backend_prefixes")
                .source(env),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// The backend scope described by `base_url` and `backend_prefixes`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the URL or a prefix is malformed.
    pub fn scope(&self) -> Result<BackendScope, ConfigError> {
        BackendScope::parse(&self.base_url, self.backend_prefixes.iter().cloned())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Directory holding session files.
    #[must_use]
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DEFAULT_FILE_STEM)
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        self.scope().map(|_| ())
    }
}

fn default_user_agent() -> String {
    format!("cityportal/{}", env!("CARGO_PKG_VERSION"))
}
