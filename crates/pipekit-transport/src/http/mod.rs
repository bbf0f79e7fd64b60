//! HTTP connection implementation
//!
//! Provides a reqwest-backed [`ConnectionPreparer`](crate::ConnectionPreparer)
//! that builds per-entity URLs and buffers each exchange.

pub mod connection;

pub use connection::{HttpConnectionConfig, ReqwestConnection, ReqwestConnectionPreparer};
