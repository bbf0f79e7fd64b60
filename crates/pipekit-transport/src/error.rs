//! Transport error types

use thiserror::Error;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur in transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    /// The exchange failed before a status code was obtained
    /// (connection refused, I/O fault, no runtime to drive the request).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with a status code of 400 or above.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl TransportError {
    /// The HTTP failure carried by this error, if the server answered.
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }

    /// Status code of the failed response, if the server answered.
    pub fn status_code(&self) -> Option<u16> {
        self.as_http().map(HttpError::status_code)
    }
}

/// A response whose status code was 400 or above.
///
/// Holds the status code and the error stream exactly as received. The body
/// is never decoded, trimmed or truncated; an absent error stream yields an
/// empty body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP error (status {status_code})")]
pub struct HttpError {
    status_code: u16,
    data: Vec<u8>,
}

impl HttpError {
    /// Create a new HTTP error from a status code and raw error body
    pub fn new(status_code: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code,
            data: data.into(),
        }
    }

    /// HTTP status code of the failed response
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Raw bytes of the error stream
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the error, returning the raw error body
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Error body as text, if it is valid UTF-8
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}
