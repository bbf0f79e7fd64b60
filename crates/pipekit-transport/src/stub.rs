//! Recording stub connections for tests
//!
//! [`StubConnectionPreparer`] answers every request with a canned
//! [`StubResponse`] and records what the transport did with each connection,
//! so tests can assert on method, id, headers and the exact body that was
//! written before the response was read.

use crate::connection::{Connection, ConnectionPreparer};
use http::Method;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Canned response returned by stub connections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StubResponse {
    /// Status code returned by `response_code`
    pub status: u16,
    /// Bytes served by the input stream
    pub body: Vec<u8>,
    /// Bytes served by the error stream; `None` means no error stream
    pub error_body: Option<Vec<u8>>,
    /// Header fields, multi-valued
    pub headers: Vec<(String, Vec<String>)>,
}

impl StubResponse {
    /// A 200 response with `body`
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::with_status(200, body)
    }

    /// A response with any status whose success stream carries `body`
    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Default::default()
        }
    }

    /// A failed response whose error stream carries `error_body`
    pub fn failure(status: u16, error_body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            error_body: Some(error_body.into()),
            ..Default::default()
        }
    }

    /// Add a header field with one or more values
    pub fn header(mut self, name: impl Into<String>, values: &[&str]) -> Self {
        self.headers.push((
            name.into(),
            values.iter().map(|v| (*v).to_string()).collect(),
        ));
        self
    }
}

/// What the transport did with one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Identifier passed to the preparer
    pub id: Option<String>,
    /// Last request method set
    pub method: Method,
    /// Request headers, in the order they were set
    pub request_headers: Vec<(String, String)>,
    /// Body written before `response_code` was called
    pub request_body: Vec<u8>,
    /// Whether the output stream was ever opened
    pub body_opened: bool,
    /// Whether `response_code` was called
    pub responded: bool,
}

impl Exchange {
    fn new(id: Option<&str>) -> Self {
        Self {
            id: id.map(str::to_owned),
            method: Method::GET,
            request_headers: Vec::new(),
            request_body: Vec::new(),
            body_opened: false,
            responded: false,
        }
    }

    /// Value of the first request header with this name
    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.request_headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

type Shared<T> = Arc<Mutex<T>>;

fn lock<T>(shared: &Shared<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Preparer handing out stub connections that share one canned response
#[derive(Debug, Clone)]
pub struct StubConnectionPreparer {
    response: Shared<StubResponse>,
    exchanges: Shared<Vec<Exchange>>,
    refuse: Option<io::ErrorKind>,
}

impl StubConnectionPreparer {
    /// Create a preparer answering every request with `response`
    pub fn new(response: StubResponse) -> Self {
        Self {
            response: Arc::new(Mutex::new(response)),
            exchanges: Arc::new(Mutex::new(Vec::new())),
            refuse: None,
        }
    }

    /// Create a preparer that fails every `prepare` call with `kind`
    pub fn refusing(kind: io::ErrorKind) -> Self {
        Self {
            refuse: Some(kind),
            ..Self::new(StubResponse::default())
        }
    }

    /// Replace the canned response for subsequent connections
    pub fn set_response(&self, response: StubResponse) {
        *lock(&self.response) = response;
    }

    /// All exchanges recorded so far, oldest first
    pub fn exchanges(&self) -> Vec<Exchange> {
        lock(&self.exchanges).clone()
    }

    /// The most recent exchange
    pub fn last_exchange(&self) -> Option<Exchange> {
        lock(&self.exchanges).last().cloned()
    }
}

impl ConnectionPreparer for StubConnectionPreparer {
    fn prepare(&self, id: Option<&str>) -> io::Result<Box<dyn Connection>> {
        if let Some(kind) = self.refuse {
            return Err(io::Error::new(kind, "stub connection refused"));
        }

        let mut exchanges = lock(&self.exchanges);
        exchanges.push(Exchange::new(id));
        Ok(Box::new(StubConnection {
            response: lock(&self.response).clone(),
            exchanges: Arc::clone(&self.exchanges),
            index: exchanges.len() - 1,
            method: Method::GET,
            body: Vec::new(),
            responded: false,
        }))
    }
}

/// A single stub exchange
#[derive(Debug)]
pub struct StubConnection {
    response: StubResponse,
    exchanges: Shared<Vec<Exchange>>,
    index: usize,
    method: Method,
    body: Vec<u8>,
    responded: bool,
}

impl StubConnection {
    fn record(&self, update: impl FnOnce(&mut Exchange)) {
        if let Some(exchange) = lock(&self.exchanges).get_mut(self.index) {
            update(exchange);
        }
    }
}

impl Connection for StubConnection {
    fn set_request_method(&mut self, method: Method) {
        self.record(|e| e.method = method.clone());
        self.method = method;
    }

    fn request_method(&self) -> &Method {
        &self.method
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.record(|e| e.request_headers.push((name.to_owned(), value.to_owned())));
        Ok(())
    }

    fn output_stream(&mut self) -> io::Result<&mut dyn Write> {
        if self.responded {
            return Err(io::Error::other("request body written after response"));
        }
        self.record(|e| e.body_opened = true);
        Ok(&mut self.body as &mut dyn Write)
    }

    fn response_code(&mut self) -> io::Result<u16> {
        if !self.responded {
            self.responded = true;
            let body = self.body.clone();
            self.record(|e| {
                e.request_body = body;
                e.responded = true;
            });
        }
        Ok(self.response.status)
    }

    fn input_stream(&mut self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(Cursor::new(self.response.body.as_slice())))
    }

    fn error_stream(&mut self) -> Option<Box<dyn Read + '_>> {
        self.response
            .error_body
            .as_deref()
            .map(|data| Box::new(Cursor::new(data)) as Box<dyn Read + '_>)
    }

    fn header_fields(&self) -> Vec<(String, Vec<String>)> {
        self.response.headers.clone()
    }
}
