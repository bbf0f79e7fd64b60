//! REST transport layer for pipekit
//!
//! Executes the four CRUD verbs over a pluggable connection primitive and
//! normalizes every outcome the same way, whichever verb produced it.
//!
//! # Architecture
//!
//! - **Connection traits**: [`Connection`] and [`ConnectionPreparer`], the only
//!   integration point with sockets, TLS and URL building
//! - **RestTransport**: one blocking round trip per call
//! - **Response extraction**: [`HeaderAndBody`] on success, [`HttpError`] for
//!   any status of 400 or above
//! - **HTTP connection**: a reqwest-backed [`ConnectionPreparer`]
//!
//! # Usage
//!
//! ```ignore
//! use pipekit_transport::{RestTransport, http::ReqwestConnectionPreparer};
//!
//! // inside a multi-threaded tokio runtime
//! let preparer = ReqwestConnectionPreparer::new("https://example.com/tasks".parse()?)?;
//! let transport = RestTransport::new(preparer);
//! let response = tokio::task::spawn_blocking(move || transport.get()).await??;
//! println!("{}", response.body().len());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod connection;
pub mod error;
pub mod http;
pub mod observability;
pub mod response;
pub mod rest;

#[cfg(any(test, feature = "test-util"))]
pub mod stub;

// Re-export commonly used types
pub use auth::AuthenticationModule;
pub use connection::{Connection, ConnectionPreparer};
pub use error::{HttpError, Result, TransportError};
pub use http::ReqwestConnectionPreparer;
pub use response::HeaderAndBody;
pub use rest::RestTransport;

// The connection contract speaks in these types
pub use ::http::Method;
pub use url::Url;
