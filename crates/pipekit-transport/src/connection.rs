//! Connection contract consumed by the REST transport
//!
//! A [`ConnectionPreparer`] hands out one [`Connection`] per request. The
//! transport never touches sockets, TLS or URLs directly; everything below
//! these traits belongs to the implementation.

use http::Method;
use std::io::{self, Read, Write};

/// A single HTTP exchange, driven step by step.
///
/// The call order used by the transport is: optional headers, method,
/// optional body via [`output_stream`](Connection::output_stream), then
/// [`response_code`](Connection::response_code), which performs the exchange.
/// The response accessors are only meaningful after that.
pub trait Connection: Send {
    /// Set the request method
    fn set_request_method(&mut self, method: Method);

    /// The request method currently configured
    fn request_method(&self) -> &Method;

    /// Add a request header
    ///
    /// # Errors
    ///
    /// Returns an error if the name or value is not a valid header.
    fn set_request_header(&mut self, name: &str, value: &str) -> io::Result<()>;

    /// Stream the request body is written to
    ///
    /// # Errors
    ///
    /// Returns an error once the exchange has been performed.
    fn output_stream(&mut self) -> io::Result<&mut dyn Write>;

    /// Perform the exchange (if not already done) and return the status code
    ///
    /// # Errors
    ///
    /// Returns an error if no status code could be obtained.
    fn response_code(&mut self) -> io::Result<u16>;

    /// Body of a successful response
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be read.
    fn input_stream(&mut self) -> io::Result<Box<dyn Read + '_>>;

    /// Body of a failed response, if the server sent one
    fn error_stream(&mut self) -> Option<Box<dyn Read + '_>>;

    /// Response headers, each name with every value received for it
    fn header_fields(&self) -> Vec<(String, Vec<String>)>;
}

/// Supplier of ready-to-use connections for one resource.
///
/// `id` is `None` for collection-level requests (get, post) and carries the
/// entity identifier for put and delete, so the preparer can build the
/// matching sub-path.
pub trait ConnectionPreparer: Send + Sync {
    /// Open a connection for the resource, or for one entity of it
    ///
    /// # Errors
    ///
    /// Returns an error if no connection could be prepared.
    fn prepare(&self, id: Option<&str>) -> io::Result<Box<dyn Connection>>;
}
