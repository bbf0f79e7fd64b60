//! Error types for pipekit
//!
//! Pipe operations report every failure through one [`Error`] enum. HTTP
//! failures keep the original status code and raw body; transport failures
//! are passed through untouched.

use pipekit_transport::{HttpError, TransportError};
use thiserror::Error;

/// Result type alias for pipe and pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pipekit.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport failed or the server answered with a status of 400 or above.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A body could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Invalid pipe or pipeline configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// No factory can build pipes of this type.
    #[error("Unsupported pipe type: {0}")]
    UnsupportedPipeType(String),

    /// A pipe with this name is registered and the pipeline rejects duplicates.
    #[error("A pipe named '{0}' is already registered")]
    DuplicatePipe(String),

    /// The blocking worker running the request did not complete.
    #[error("Pipe worker failed: {0}")]
    Worker(String),
}

impl Error {
    /// The HTTP failure behind this error, if the server answered.
    pub fn http_error(&self) -> Option<&HttpError> {
        match self {
            Error::Transport(err) => err.as_http(),
            _ => None,
        }
    }

    /// Status code of the failed response, if the server answered.
    pub fn status_code(&self) -> Option<u16> {
        self.http_error().map(HttpError::status_code)
    }

    /// Check if this error is a transport-level failure (no status obtained).
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Transport(TransportError::Io(_)))
    }
}

impl From<HttpError> for Error {
    fn from(err: HttpError) -> Self {
        Error::Transport(err.into())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Worker(err.to_string())
    }
}
