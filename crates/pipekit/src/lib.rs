//! # pipekit
//!
//! Named, per-resource CRUD pipes over a pluggable REST transport:
//! - [`Pipe`]s read, save and remove the items of one remote resource
//! - a [`Pipeline`] creates pipes and looks them up by name
//! - HTTP failures surface as errors carrying the status code and raw body
//! - authentication modules add credentials to every request
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pipekit::{PipeExt, Pipeline, Resource};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Task {
//!     id: Option<u64>,
//!     title: String,
//! }
//!
//! impl Resource for Task {
//!     const NAME: &'static str = "tasks";
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::new("http://localhost:8080/todo-server".parse()?);
//!     let tasks = pipeline.pipe::<Task>().await?;
//!
//!     let saved = tasks.save_as(&Task { id: None, title: "write docs".into() }).await?;
//!     for task in tasks.read_as::<Task>().await? {
//!         println!("{task:?}");
//!     }
//!     if let Some(id) = saved.id {
//!         tasks.remove(&id.to_string()).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Pipes built by the default factory drive a blocking connection from
//! tokio's blocking pool, so they need a multi-threaded runtime.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Re-export commonly used types
pub use auth::{AuthenticationModule, BasicAuthentication, TokenAuthentication};
pub use codec::{Codec, JsonCodec};
pub use config::{DuplicatePolicy, PipeConfig, PipeConfigBuilder, PipeType, PipelineConfig};
pub use error::{Error, Result};
pub use factory::{DefaultPipeFactory, PipeFactory};
pub use pipe::{Pipe, PipeExt, RestPipe};
pub use pipeline::{Pipeline, PipelineBuilder, Resource};
pub use pipekit_transport::{HeaderAndBody, HttpError, TransportError};

// Module declarations
pub mod auth;
pub mod codec;
pub mod config;
pub mod error;
pub mod factory;
#[cfg(feature = "trace")]
#[cfg_attr(docsrs, doc(cfg(feature = "trace")))]
pub mod observability;
pub mod pipe;
pub mod pipeline;

/// Transport layer, re-exported for custom connections
pub use pipekit_transport as transport;

/// Version of the pipekit crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AuthenticationModule, Error, HttpError, Pipe, PipeConfig, PipeExt, Pipeline, Resource,
        Result,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_prelude_exports() {
        use crate::prelude::*;

        let config = PipeConfig::new("http://localhost/".parse().unwrap(), "tasks").unwrap();
        let pipeline = Pipeline::new(config.base_url().clone());
        let _: Option<Error> = None;
        assert_eq!(pipeline.base_url().as_str(), "http://localhost/");
    }
}
