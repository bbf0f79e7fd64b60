//! Pipes: CRUD handles bound to one resource
//!
//! A [`Pipe`] hides the transport behind three asynchronous operations.
//! [`RestPipe`] is the REST implementation: it runs each blocking
//! [`RestTransport`] call on tokio's blocking pool and converts bodies with
//! a [`Codec`].

use crate::codec::{Codec, JsonCodec};
use crate::config::{PipeConfig, PipeType};
use crate::error::Result;
use async_trait::async_trait;
use pipekit_transport::{AuthenticationModule, ConnectionPreparer, RestTransport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use url::Url;

/// A named handle for reading, saving and removing items of one resource.
///
/// Every operation completes exactly once, with either its value or an
/// [`Error`](crate::Error). HTTP failures keep the status code and the raw
/// response body:
///
/// ```no_run
/// # async fn example(pipe: std::sync::Arc<dyn pipekit::Pipe>) {
/// match pipe.read().await {
///     Ok(items) => println!("{} items", items.len()),
///     Err(err) => match err.http_error() {
///         Some(http) => eprintln!("server said {}: {:?}", http.status_code(), http.text()),
///         None => eprintln!("request failed: {err}"),
///     },
/// }
/// # }
/// ```
#[async_trait]
pub trait Pipe: Send + Sync + fmt::Debug {
    /// Name the pipe is registered under
    fn name(&self) -> &str;

    /// URL of the resource collection
    fn url(&self) -> &Url;

    /// Kind of pipe
    fn pipe_type(&self) -> PipeType;

    /// Fetch every item of the resource
    async fn read(&self) -> Result<Vec<Value>>;

    /// Create or update an item, returning the item as stored by the server
    async fn save(&self, item: Value) -> Result<Value>;

    /// Delete the item with this id
    async fn remove(&self, id: &str) -> Result<()>;

    /// Attach or detach the authentication module used by later requests
    fn set_authentication_module(&self, module: Option<Arc<dyn AuthenticationModule>>);
}

/// Typed access to pipes through serde.
#[async_trait]
pub trait PipeExt: Pipe {
    /// Fetch every item, deserialized as `T`
    async fn read_as<T>(&self) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.read()
            .await?
            .into_iter()
            .map(|item| Ok(serde_json::from_value(item)?))
            .collect()
    }

    /// Save a typed item and deserialize the stored version
    async fn save_as<T>(&self, item: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Sync,
    {
        let saved = self.save(serde_json::to_value(item)?).await?;
        Ok(serde_json::from_value(saved)?)
    }
}

impl<P: Pipe + ?Sized> PipeExt for P {}

/// REST implementation of [`Pipe`].
pub struct RestPipe {
    config: PipeConfig,
    url: Url,
    transport: RestTransport,
    authentication: RwLock<Option<Arc<dyn AuthenticationModule>>>,
    codec: Arc<dyn Codec>,
}

impl RestPipe {
    /// Create a pipe over a connection preparer for `config`'s resource URL
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`](crate::Error::InvalidUrl) if the
    /// resource URL cannot be formed.
    pub fn new(config: PipeConfig, preparer: impl ConnectionPreparer + 'static) -> Result<Self> {
        Self::from_shared(config, Arc::new(preparer))
    }

    /// Create a pipe over an already shared connection preparer
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn from_shared(config: PipeConfig, preparer: Arc<dyn ConnectionPreparer>) -> Result<Self> {
        Ok(Self {
            url: config.resource_url()?,
            config,
            transport: RestTransport::from_shared(preparer),
            authentication: RwLock::new(None),
            codec: Arc::new(JsonCodec),
        })
    }

    /// Use a different codec for bodies
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Configuration the pipe was built from
    pub fn config(&self) -> &PipeConfig {
        &self.config
    }

    /// Whether an authentication module is attached
    pub fn is_authenticated(&self) -> bool {
        self.authentication().is_some()
    }

    fn authentication(&self) -> Option<Arc<dyn AuthenticationModule>> {
        self.authentication
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run one transport call on the blocking pool
    async fn run<T, F>(&self, call: F) -> Result<T>
    where
        F: FnOnce(RestTransport) -> pipekit_transport::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let transport = self
            .transport
            .clone()
            .with_authentication(self.authentication());
        let result = tokio::task::spawn_blocking(move || call(transport)).await?;
        Ok(result?)
    }
}

#[async_trait]
impl Pipe for RestPipe {
    fn name(&self) -> &str {
        self.config.name()
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn pipe_type(&self) -> PipeType {
        self.config.pipe_type()
    }

    #[tracing::instrument(skip(self), fields(pipe = %self.config.name()))]
    async fn read(&self) -> Result<Vec<Value>> {
        let response = self.run(|transport| transport.get()).await?;
        let items = match self.codec.decode(response.body())? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            item => vec![item],
        };
        tracing::debug!(count = items.len(), "read items");
        Ok(items)
    }

    #[tracing::instrument(skip(self, item), fields(pipe = %self.config.name()))]
    async fn save(&self, item: Value) -> Result<Value> {
        let body = self.codec.encode(&item)?;
        let response = match record_id(&item, self.config.id_field()) {
            Some(id) => {
                tracing::debug!(%id, "updating item");
                self.run(move |transport| transport.put(&id, body)).await?
            }
            None => {
                tracing::debug!("creating item");
                self.run(move |transport| transport.post(body)).await?
            }
        };

        match self.codec.decode(response.body())? {
            Value::Null => Ok(item),
            saved => Ok(saved),
        }
    }

    #[tracing::instrument(skip(self), fields(pipe = %self.config.name()))]
    async fn remove(&self, id: &str) -> Result<()> {
        let id = id.to_owned();
        self.run(move |transport| transport.delete(&id)).await?;
        Ok(())
    }

    fn set_authentication_module(&self, module: Option<Arc<dyn AuthenticationModule>>) {
        *self
            .authentication
            .write()
            .unwrap_or_else(PoisonError::into_inner) = module;
    }
}

impl fmt::Debug for RestPipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestPipe")
            .field("name", &self.config.name())
            .field("url", &self.url.as_str())
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

/// Identifier of an item, if it has one.
///
/// Strings and numbers count; null, empty strings and other values mean the
/// item has not been stored yet.
fn record_id(item: &Value, id_field: &str) -> Option<String> {
    match item.get(id_field)? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
