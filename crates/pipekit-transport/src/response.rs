//! Uniform response extraction
//!
//! Every verb funnels through [`extract_response`], so success and failure
//! look the same to callers no matter which request produced them.

use crate::connection::Connection;
use crate::error::{HttpError, Result};
use std::collections::HashMap;
use std::io::Read;

/// Lowest status code treated as a failure.
pub const ERROR_STATUS_THRESHOLD: u16 = 400;

/// Headers and raw body of a completed, successful exchange.
///
/// Header names are stored as received. Lookups try the exact name first and
/// then fall back to an ASCII case-insensitive match, since connections may
/// normalize names. Only the first value is kept when a header arrives more
/// than once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderAndBody {
    body: Vec<u8>,
    headers: HashMap<String, String>,
}

impl HeaderAndBody {
    /// Create a new value from a body and a header map
    pub fn new(body: impl Into<Vec<u8>>, headers: HashMap<String, String>) -> Self {
        Self {
            body: body.into(),
            headers,
        }
    }

    /// Raw response body; empty for a 0-byte response
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consume the value, returning the body
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Value of the header with this name, `None` if absent
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// All response headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Get the response body as a string
    pub fn text(&self) -> std::result::Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}

/// Read a completed exchange into a [`HeaderAndBody`] or an [`HttpError`].
///
/// Below [`ERROR_STATUS_THRESHOLD`] the input stream and headers are read;
/// from it upward the error stream is read (absent means empty) and no
/// `HeaderAndBody` is built.
///
/// # Errors
///
/// Returns [`crate::TransportError::Http`] for failure statuses and
/// [`crate::TransportError::Io`] if a stream cannot be read.
pub fn extract_response(connection: &mut dyn Connection, status: u16) -> Result<HeaderAndBody> {
    if status >= ERROR_STATUS_THRESHOLD {
        let mut data = Vec::new();
        if let Some(mut stream) = connection.error_stream() {
            stream.read_to_end(&mut data)?;
        }
        return Err(HttpError::new(status, data).into());
    }

    let mut body = Vec::new();
    connection.input_stream()?.read_to_end(&mut body)?;
    let headers = first_values(connection.header_fields());

    Ok(HeaderAndBody::new(body, headers))
}

/// Collapse multi-valued header fields to the first value per name.
fn first_values(fields: Vec<(String, Vec<String>)>) -> HashMap<String, String> {
    let mut headers = HashMap::with_capacity(fields.len());
    for (name, values) in fields {
        if let Some(first) = values.into_iter().next() {
            headers.entry(name).or_insert(first);
        }
    }
    headers
}
