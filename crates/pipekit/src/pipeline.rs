//! Pipe registry
//!
//! A [`Pipeline`] creates pipes through its [`PipeFactory`] and keeps them
//! under their names. Lookups never construct anything.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

use crate::config::{DuplicatePolicy, PipeConfig, PipelineConfig};
use crate::error::{Error, Result};
use crate::factory::{DefaultPipeFactory, PipeFactory};
use crate::pipe::Pipe;

/// A resource type with a declared name.
///
/// The name is the registry key; the endpoint defaults to it.
///
/// ```
/// use pipekit::Resource;
///
/// struct Task;
///
/// impl Resource for Task {
///     const NAME: &'static str = "tasks";
/// }
///
/// struct Project;
///
/// impl Resource for Project {
///     const NAME: &'static str = "projects";
///     const ENDPOINT: &'static str = "v2/projects";
/// }
/// ```
pub trait Resource {
    /// Name the pipe is registered under
    const NAME: &'static str;

    /// Endpoint path under the pipeline's base URL
    const ENDPOINT: &'static str = Self::NAME;
}

/// Registry of named pipes sharing one base URL.
#[derive(Clone)]
pub struct Pipeline {
    /// Registered pipes (name → pipe)
    pipes: Arc<RwLock<HashMap<String, Arc<dyn Pipe>>>>,

    /// Base URL for pipes declared through [`Resource`]
    base_url: Url,

    /// Builds pipes from their configuration
    factory: Arc<dyn PipeFactory>,

    duplicate_policy: DuplicatePolicy,
}

impl Pipeline {
    /// Create a pipeline with the default factory
    pub fn new(base_url: Url) -> Self {
        Self::builder(base_url).build()
    }

    /// Create a new builder for configuring the pipeline
    #[must_use]
    pub fn builder(base_url: Url) -> PipelineBuilder {
        PipelineBuilder {
            base_url,
            factory: None,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }

    /// Create a pipeline from configuration
    ///
    /// Pipes are built by a [`DefaultPipeFactory`] carrying the configured
    /// timeouts and headers.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is missing or invalid.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self::builder(config.parsed_base_url()?)
            .factory(Arc::new(DefaultPipeFactory::with_connection_config(
                config.connection_config(),
            )))
            .duplicate_policy(config.duplicate_policy)
            .build())
    }

    /// Base URL for declared resources
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Policy applied when a name is registered twice
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Create and register the pipe for a declared resource
    ///
    /// # Errors
    ///
    /// Returns an error if the pipe cannot be built, or if the name is taken
    /// and duplicates are rejected.
    pub async fn pipe<R: Resource>(&self) -> Result<Arc<dyn Pipe>> {
        let config = PipeConfig::builder(self.base_url.clone(), R::NAME)
            .endpoint(R::ENDPOINT)
            .build()?;
        self.pipe_with_config(config).await
    }

    /// Create a pipe from `config` and register it under `config.name()`
    ///
    /// # Errors
    ///
    /// See [`pipe`](Self::pipe).
    pub async fn pipe_with_config(&self, config: PipeConfig) -> Result<Arc<dyn Pipe>> {
        let name = config.name().to_string();

        if self.duplicate_policy == DuplicatePolicy::Reject && self.contains(&name).await {
            return Err(Error::DuplicatePipe(name));
        }

        let pipe = self.factory.create_pipe(&config)?;

        let mut pipes = self.pipes.write().await;
        if pipes.contains_key(&name) {
            match self.duplicate_policy {
                DuplicatePolicy::Reject => return Err(Error::DuplicatePipe(name)),
                DuplicatePolicy::Replace => {
                    tracing::warn!(pipe = %name, "replacing registered pipe");
                }
            }
        }
        pipes.insert(name.clone(), Arc::clone(&pipe));
        tracing::debug!(pipe = %name, url = %pipe.url(), "registered pipe");

        Ok(pipe)
    }

    /// Get a registered pipe by name
    pub async fn get(&self, name: &str) -> Option<Arc<dyn Pipe>> {
        let pipes = self.pipes.read().await;
        pipes.get(name).cloned()
    }

    /// Unregister a pipe, returning it if it was registered
    pub async fn remove(&self, name: &str) -> Option<Arc<dyn Pipe>> {
        let removed = self.pipes.write().await.remove(name);
        if removed.is_some() {
            tracing::debug!(pipe = %name, "removed pipe");
        }
        removed
    }

    /// Check if a pipe is registered
    pub async fn contains(&self, name: &str) -> bool {
        let pipes = self.pipes.read().await;
        pipes.contains_key(name)
    }

    /// Get the number of registered pipes
    pub async fn len(&self) -> usize {
        let pipes = self.pipes.read().await;
        pipes.len()
    }

    /// Check if the pipeline is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Names of all registered pipes, sorted
    pub async fn names(&self) -> Vec<String> {
        let pipes = self.pipes.read().await;
        let mut names: Vec<String> = pipes.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("base_url", &self.base_url.as_str())
            .field("duplicate_policy", &self.duplicate_policy)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring a `Pipeline`
pub struct PipelineBuilder {
    base_url: Url,
    factory: Option<Arc<dyn PipeFactory>>,
    duplicate_policy: DuplicatePolicy,
}

impl PipelineBuilder {
    /// Set the pipe factory (default: `DefaultPipeFactory`)
    #[must_use]
    pub fn factory(mut self, factory: Arc<dyn PipeFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Set the duplicate-name policy (default: `Replace`)
    #[must_use]
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        Pipeline {
            pipes: Arc::new(RwLock::new(HashMap::new())),
            base_url: self.base_url,
            factory: self
                .factory
                .unwrap_or_else(|| Arc::new(DefaultPipeFactory::new())),
            duplicate_policy: self.duplicate_policy,
        }
    }
}
