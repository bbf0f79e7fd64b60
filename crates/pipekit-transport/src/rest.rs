//! REST verb executor
//!
//! [`RestTransport`] runs one GET, POST, PUT or DELETE per call: it obtains a
//! connection, configures it, sends the request and hands the completed
//! exchange to [`extract_response`].

use crate::auth::AuthenticationModule;
use crate::connection::ConnectionPreparer;
use crate::error::{Result, TransportError};
use crate::observability::{RequestMetadata, RequestTimer, ResponseMetadata};
use crate::response::{HeaderAndBody, extract_response};
use http::Method;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

/// Executes CRUD verbs against one resource.
///
/// Each call is a single sequential round trip on its own connection:
/// connect, write, read. There is no retry and no shared mutable state, so
/// clones can be used from several threads at once.
///
/// All calls block. Callers on an async runtime should move them onto a
/// blocking worker (`tokio::task::spawn_blocking`).
#[derive(Clone)]
pub struct RestTransport {
    preparer: Arc<dyn ConnectionPreparer>,
    authentication: Option<Arc<dyn AuthenticationModule>>,
}

impl RestTransport {
    /// Create a transport over a connection preparer
    pub fn new(preparer: impl ConnectionPreparer + 'static) -> Self {
        Self::from_shared(Arc::new(preparer))
    }

    /// Create a transport over an already shared connection preparer
    pub fn from_shared(preparer: Arc<dyn ConnectionPreparer>) -> Self {
        Self {
            preparer,
            authentication: None,
        }
    }

    /// Set the authentication module consulted before every request
    pub fn with_authentication(mut self, module: Option<Arc<dyn AuthenticationModule>>) -> Self {
        self.authentication = module;
        self
    }

    /// Whether an authentication module is attached
    pub fn is_authenticated(&self) -> bool {
        self.authentication.is_some()
    }

    /// Fetch the resource collection
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] for a status of 400 or above and
    /// [`TransportError::Io`] if the exchange itself fails.
    pub fn get(&self) -> Result<HeaderAndBody> {
        self.execute(Method::GET, None, None)
    }

    /// Create a new entity from `payload`
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub fn post(&self, payload: impl AsRef<[u8]>) -> Result<HeaderAndBody> {
        self.execute(Method::POST, None, Some(payload.as_ref()))
    }

    /// Replace the entity `id` with `payload`
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub fn put(&self, id: &str, payload: impl AsRef<[u8]>) -> Result<HeaderAndBody> {
        self.execute(Method::PUT, Some(id), Some(payload.as_ref()))
    }

    /// Delete the entity `id`
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub fn delete(&self, id: &str) -> Result<HeaderAndBody> {
        self.execute(Method::DELETE, Some(id), None)
    }

    fn execute(
        &self,
        method: Method,
        id: Option<&str>,
        payload: Option<&[u8]>,
    ) -> Result<HeaderAndBody> {
        let mut request = RequestMetadata::new(method.as_str(), id);
        if let Some(payload) = payload {
            request = request.with_body_size(payload.len());
        }
        request.log_request();
        let timer = RequestTimer::start();

        let mut connection = self.preparer.prepare(id)?;
        if let Some(module) = &self.authentication {
            module.authenticate(&mut *connection)?;
        }

        connection.set_request_method(method);
        if let Some(payload) = payload {
            let stream = connection.output_stream()?;
            stream.write_all(payload)?;
            stream.flush()?;
        }

        let status = connection.response_code()?;
        let result = extract_response(&mut *connection, status);

        match &result {
            Ok(response) => ResponseMetadata::new(status, response.body().len(), timer.elapsed())
                .log_success(&request),
            Err(TransportError::Http(err)) => {
                ResponseMetadata::new(status, err.data().len(), timer.elapsed()).log_error(&request)
            }
            Err(_) => {}
        }

        result
    }
}

impl fmt::Debug for RestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestTransport")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
