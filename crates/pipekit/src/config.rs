//! Configuration for pipes and pipelines

use crate::error::{Error, Result};
use pipekit_transport::http::HttpConnectionConfig;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Default field holding an item's identifier.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Default content type for request and response bodies.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Kind of pipe a factory should build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PipeType {
    /// CRUD over REST endpoints
    #[default]
    Rest,
}

impl PipeType {
    /// Name of the pipe type
    pub fn name(&self) -> &'static str {
        match self {
            PipeType::Rest => "REST",
        }
    }
}

impl FromStr for PipeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(PipeType::Rest),
            _ => Err(Error::UnsupportedPipeType(s.trim().to_string())),
        }
    }
}

impl fmt::Display for PipeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Binds one resource to a base URL and a registry name.
///
/// `name` is the key the pipe is registered under; `endpoint` is the path
/// segment appended to `base_url` and defaults to the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeConfig {
    base_url: Url,
    name: String,
    endpoint: String,
    pipe_type: PipeType,
    id_field: String,
    content_type: String,
}

impl PipeConfig {
    /// Create a configuration with defaults for everything but the name
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the name is empty or the base URL
    /// cannot carry a path.
    pub fn new(base_url: Url, name: impl Into<String>) -> Result<Self> {
        Self::builder(base_url, name).build()
    }

    /// Start building a configuration
    pub fn builder(base_url: Url, name: impl Into<String>) -> PipeConfigBuilder {
        PipeConfigBuilder {
            base_url,
            name: name.into(),
            endpoint: None,
            pipe_type: PipeType::default(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }

    /// Base URL of the server
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Registry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Endpoint path under the base URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Kind of pipe to build
    pub fn pipe_type(&self) -> PipeType {
        self.pipe_type
    }

    /// Field holding an item's identifier
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Content type of request bodies
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Full URL of the resource collection
    ///
    /// The endpoint is always resolved below the base URL's path, whether or
    /// not the base URL ends in a slash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the endpoint does not form a valid URL.
    pub fn resource_url(&self) -> Result<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(self.endpoint.trim_start_matches('/'))?)
    }
}

/// Builder for [`PipeConfig`]
#[derive(Debug, Clone)]
pub struct PipeConfigBuilder {
    base_url: Url,
    name: String,
    endpoint: Option<String>,
    pipe_type: PipeType,
    id_field: String,
    content_type: String,
}

impl PipeConfigBuilder {
    /// Set the endpoint path (default: the pipe name)
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the pipe type
    #[must_use]
    pub fn pipe_type(mut self, pipe_type: PipeType) -> Self {
        self.pipe_type = pipe_type;
        self
    }

    /// Set the identifier field (default: `id`)
    #[must_use]
    pub fn id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Set the body content type (default: `application/json`)
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the name or id field is empty, or
    /// the base URL cannot carry a path.
    pub fn build(self) -> Result<PipeConfig> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidConfig(
                "pipe name must not be empty".to_string(),
            ));
        }
        if self.id_field.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "pipe '{name}' has an empty id field"
            )));
        }
        if self.base_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "base URL '{}' cannot carry a resource path",
                self.base_url
            )));
        }

        Ok(PipeConfig {
            base_url: self.base_url,
            endpoint: self.endpoint.unwrap_or_else(|| name.clone()),
            name,
            pipe_type: self.pipe_type,
            id_field: self.id_field,
            content_type: self.content_type,
        })
    }
}

/// What a pipeline does when a pipe is registered under a name already in use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Replace the registered pipe with the new one
    #[default]
    Replace,
    /// Keep the registered pipe and fail with [`Error::DuplicatePipe`]
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(DuplicatePolicy::Replace),
            "reject" => Ok(DuplicatePolicy::Reject),
            other => Err(Error::InvalidConfig(format!(
                "unknown duplicate policy '{other}' (expected 'replace' or 'reject')"
            ))),
        }
    }
}

/// Configuration for a [`crate::Pipeline`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Base URL of the server
    pub base_url: Option<String>,

    /// Whole-request timeout for pipes built by the default factory
    pub timeout: Option<Duration>,

    /// Connection timeout for pipes built by the default factory
    pub connect_timeout: Option<Duration>,

    /// Headers sent with every request
    pub default_headers: Vec<(String, String)>,

    /// Behavior on duplicate pipe names
    pub duplicate_policy: DuplicatePolicy,
}

impl PipelineConfig {
    /// Create a new configuration for a server.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored if present. This will look for:
    /// - `PIPEKIT_BASE_URL` for the server base URL
    /// - `PIPEKIT_TIMEOUT` for the request timeout (in seconds)
    /// - `PIPEKIT_CONNECT_TIMEOUT` for the connection timeout (in seconds)
    /// - `PIPEKIT_DUPLICATE_POLICY` for `replace` or `reject`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a variable is set to an invalid value.
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        use std::env;

        let _ = dotenvy::dotenv();
        let mut config = Self::default();

        if let Ok(base_url) = env::var("PIPEKIT_BASE_URL") {
            config.base_url = Some(base_url);
        }

        if let Ok(timeout) = env::var("PIPEKIT_TIMEOUT") {
            config.timeout = Some(parse_seconds("PIPEKIT_TIMEOUT", &timeout)?);
        }

        if let Ok(timeout) = env::var("PIPEKIT_CONNECT_TIMEOUT") {
            config.connect_timeout = Some(parse_seconds("PIPEKIT_CONNECT_TIMEOUT", &timeout)?);
        }

        if let Ok(policy) = env::var("PIPEKIT_DUPLICATE_POLICY") {
            config.duplicate_policy = policy.parse()?;
        }

        Ok(config)
    }

    /// Set the whole-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a header sent with every request
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Set the duplicate-name policy
    #[must_use]
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Parse the base URL
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if no base URL is set and
    /// [`Error::InvalidUrl`] if it does not parse.
    pub fn parsed_base_url(&self) -> Result<Url> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig("no base URL configured".to_string()))?;
        Ok(Url::parse(base_url)?)
    }

    /// Connection settings handed to the default pipe factory
    pub fn connection_config(&self) -> HttpConnectionConfig {
        HttpConnectionConfig {
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            default_headers: self.default_headers.clone(),
        }
    }
}

#[cfg(feature = "env")]
fn parse_seconds(var: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| Error::InvalidConfig(format!("{var}='{value}': {e}")))
}
